//! Presentation layer for llm-council
//!
//! This crate contains CLI definitions, output formatters and the
//! progress display that follows a run's event stream.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, ProgressView, SimpleProgress, describe, follow};
