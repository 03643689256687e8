//! Console output formatter for council results

use colored::Colorize;
use council_domain::{
    HealthStatus, ModelDescriptor, PipelineResult, ResponseStatus, ResultStatus,
};

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &PipelineResult, prompt: &str) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Prompt:".cyan().bold(), prompt));
        output.push_str(&format!(
            "{} {}\n",
            "Run:".cyan().bold(),
            result.correlation_id
        ));
        output.push_str(&format!(
            "{} {}\n\n",
            "Status:".cyan().bold(),
            Self::status_label(result)
        ));

        if !result.model_responses.is_empty() {
            output.push_str(&Self::section_header("Model Responses"));
            for entry in result.model_responses.values() {
                match entry.status {
                    ResponseStatus::Success => output.push_str(&format!(
                        "\n{}\n{}\n",
                        format!("── {} ──", entry.model).yellow().bold(),
                        entry.response
                    )),
                    ResponseStatus::Error => output.push_str(&format!(
                        "\n{}\nError: {}\n",
                        format!("── {} ──", entry.model).red().bold(),
                        entry.response
                    )),
                }
            }
        }

        if !result.suggestions.is_empty() {
            output.push_str(&Self::section_header("Suggestions"));
            for cluster in &result.suggestions {
                output.push_str(&format!(
                    "  * [{:.2}] {} ({})\n",
                    cluster.confidence,
                    cluster.summary,
                    cluster
                        .models
                        .iter()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                        .dimmed()
                ));
            }
        }

        if let Some(ultra) = &result.ultra_model {
            output.push_str(&Self::section_header("Final Synthesis"));
            output.push_str(&format!(
                "\n{}\n\n{}\n",
                format!("Ultra model: {}", ultra).yellow().bold(),
                result.combined_response
            ));
        }

        if let Some(error) = &result.error {
            output.push_str(&format!(
                "\n{} {}: {}\n",
                "Error".red().bold(),
                error.code,
                error.message
            ));
        }

        output.push_str(&format!(
            "\n{} {:.2}s{}\n",
            "Processing time:".dimmed(),
            result.processing_time,
            if result.cached { " (cached)" } else { "" }
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &PipelineResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format synthesis only (concise output)
    pub fn format_synthesis_only(result: &PipelineResult, prompt: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Conclusion ===".cyan().bold()
        ));

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), prompt));

        output.push_str(&format!(
            "{} {}\n\n",
            "Models consulted:".dimmed(),
            result.models_used.join(", ")
        ));

        match &result.error {
            Some(error) => {
                let label = "Error".red().bold();
                output.push_str(&format!("{} {}: {}\n", label, error.code, error.message));
            }
            None => {
                output.push_str(&result.combined_response);
                output.push('\n');
            }
        }

        output
    }

    /// Table of registered models for `--list-models`
    pub fn format_models(models: &[ModelDescriptor]) -> String {
        if models.is_empty() {
            return "No models configured. Add [[models]] entries to council.toml.\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!(
            "{:<28} {:<12} {:>10}  {:<9} {}\n",
            "MODEL", "PROVIDER", "$/1K", "HEALTH", "CAPABILITIES"
        ));
        for model in models {
            let health = match model.health {
                HealthStatus::Ready => model.health.as_str().green(),
                HealthStatus::Error => model.health.as_str().red(),
                HealthStatus::Checking => model.health.as_str().yellow(),
            };
            output.push_str(&format!(
                "{:<28} {:<12} {:>10.4}  {:<9} {}\n",
                model.id.as_str(),
                model.provider,
                model.cost_per_1k_tokens,
                health,
                model.capabilities.join(", ")
            ));
        }
        output
    }

    fn status_label(result: &PipelineResult) -> String {
        match result.status {
            ResultStatus::Success => "success".green().to_string(),
            ResultStatus::Degraded => "degraded".yellow().to_string(),
            ResultStatus::Error => "error".red().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}
