//! Prompt domain
//!
//! Templates for the three council stages.

mod template;

pub use template::{PromptTemplate, StagePrompt, response_label};
