//! CLI command definitions

use clap::{Parser, ValueEnum};
use council_domain::RequestPayload;
use std::path::PathBuf;

/// How the final result is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every model's draft, the synthesis and the suggestion clusters
    Full,
    /// Only the final synthesis
    Synthesis,
    /// The result as JSON
    Json,
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "Ask a council of LLMs and get one synthesized answer")]
#[command(long_about = r#"
llm-council sends a prompt to several models and merges their answers.

A run has three stages:
1. Initial: every selected model drafts an answer in parallel
2. Meta: every model revises its draft after reading its peers' drafts
3. Ultra: one model synthesizes the revisions into the final answer

Configuration files are loaded from (later wins):
1. ~/.config/llm-council/config.toml   Global config
2. ./council.toml                      Project-level config
3. --config <path>                     Explicit config file
4. COUNCIL_* environment variables     e.g. COUNCIL_PIPELINE__TOP_K=4

Example:
  llm-council "What's the best way to handle errors in Rust?"
  llm-council -m gpt-4o -m sonnet --ultra sonnet "Compare async runtimes"
  llm-council --policy speed --pattern concise -o json "Summarize RAII"
"#)]
pub struct Cli {
    /// The prompt to send to the council
    pub prompt: Option<String>,

    /// Models to consult (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Selection policy when no models are given
    #[arg(long, value_parser = ["manual", "premium", "speed", "budget"])]
    pub policy: Option<String>,

    /// Analysis pattern (comparative, critical, creative, concise, ...)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Model that writes the final synthesis
    #[arg(long, value_name = "MODEL")]
    pub ultra: Option<String>,

    /// Output format requested from the models (markdown, plain, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// How the result is printed
    #[arg(short, long, value_enum, default_value = "synthesis")]
    pub output: OutputFormat,

    /// Correlation id for the run (generated when omitted)
    #[arg(long, value_name = "ID")]
    pub correlation_id: Option<String>,

    /// List registered models with their health and exit
    #[arg(long)]
    pub list_models: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write logs to a daily-rolling file under this directory
    #[arg(long, value_name = "DIR")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Request payload built from the flags; `None` when no prompt was given
    pub fn payload(&self) -> Option<RequestPayload> {
        let prompt = self.prompt.as_ref()?;
        let mut payload = RequestPayload::new(prompt.as_str());
        if !self.model.is_empty() {
            payload = payload.with_models(self.model.iter().cloned());
        }
        if let Some(policy) = &self.policy {
            payload = payload.with_policy(policy.as_str());
        }
        if let Some(pattern) = &self.pattern {
            payload = payload.with_pattern(pattern.as_str());
        }
        if let Some(ultra) = &self.ultra {
            payload = payload.with_ultra_model(ultra.as_str());
        }
        if let Some(format) = &self.format {
            payload = payload.with_output_format(format.as_str());
        }
        if let Some(id) = &self.correlation_id {
            payload = payload.with_correlation_id(id.as_str());
        }
        Some(payload)
    }
}
