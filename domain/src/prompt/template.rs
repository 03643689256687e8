//! Prompt templates for the council stages

use crate::core::model::ModelId;

/// System and user message for one model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub system: String,
    pub user: String,
}

/// Anonymous label for the `index`-th response: `Response A` .. `Response Z`,
/// then `Response AA`, `Response AB`, ...
pub fn response_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("Response {}", letters.into_iter().collect::<String>())
}

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    fn pattern_guidance(pattern: &str) -> &'static str {
        match pattern {
            "comparative" => {
                "Weigh the main alternatives against each other and make trade-offs explicit."
            }
            "critical" => "Look for flaws and unstated assumptions before recommending anything.",
            "creative" => "Favor original ideas and unexpected angles over conventional answers.",
            "concise" => "Answer as briefly as correctness allows.",
            _ => "Give a thoughtful, well-reasoned answer.",
        }
    }

    fn format_guidance(output_format: &str) -> &'static str {
        match output_format {
            "json" => "Reply with a single JSON object and nothing else.",
            "plain" | "text" => "Reply in plain text without markup.",
            _ => "Format the reply as Markdown.",
        }
    }

    /// Stage 1: each model answers independently.
    pub fn initial(question: &str, pattern: &str, output_format: &str) -> StagePrompt {
        let system = format!(
            "You are one member of a council of independent experts.\n\
             Answer the question on your own merits; other members answer separately.\n\
             {}\n{}",
            Self::pattern_guidance(pattern),
            Self::format_guidance(output_format)
        );
        let user = format!("Question:\n\n{question}\n\nProvide your best answer.");
        StagePrompt { system, user }
    }

    /// Stage 2: a model revises its own draft after reading every draft.
    ///
    /// Drafts are labeled anonymously in the given order; the reviewer's own
    /// draft is marked so it knows which one to revise.
    pub fn meta(
        question: &str,
        pattern: &str,
        drafts: &[(ModelId, String)],
        own: &ModelId,
    ) -> StagePrompt {
        let system = format!(
            "You are a council member revising your earlier answer after reading your peers' answers.\n\
             Keep what holds up, fix what they showed to be wrong, adopt their better points.\n\
             {}",
            Self::pattern_guidance(pattern)
        );

        let mut user = format!("Original question:\n\n{question}\n\nCouncil drafts:\n");
        for (index, (model, content)) in drafts.iter().enumerate() {
            let marker = if model == own { " (your draft)" } else { "" };
            user.push_str(&format!("\n--- {}{} ---\n{}\n", response_label(index), marker, content));
        }
        user.push_str(
            "\nWrite an improved version of your draft. \
             Return only the revised answer, without commentary on the other drafts.",
        );

        StagePrompt { system, user }
    }

    /// Stage 3: one model synthesizes the revised answers into the final response.
    pub fn ultra(
        question: &str,
        pattern: &str,
        output_format: &str,
        revisions: &[(ModelId, String)],
    ) -> StagePrompt {
        let system = format!(
            "You are the chair of a council of experts, writing its final answer.\n\
             Merge the members' revised answers: keep points of agreement, resolve \
             disagreements in favor of the better-supported position.\n{}\n{}",
            Self::pattern_guidance(pattern),
            Self::format_guidance(output_format)
        );

        let mut user = format!("Original question:\n\n{question}\n\nRevised answers:\n");
        for (index, (_, content)) in revisions.iter().enumerate() {
            user.push_str(&format!("\n--- {} ---\n{}\n", response_label(index), content));
        }
        user.push_str("\nWrite the council's final answer.");

        StagePrompt { system, user }
    }
}
