//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelId`]: identifier of a registered model backend
//! - [`prompt::Prompt`]: a validated prompt to pose to the council
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod prompt;
