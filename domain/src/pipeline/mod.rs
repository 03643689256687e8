//! Pipeline domain
//!
//! Entities and value objects of one council run:
//!
//! - [`request::PipelineRequest`]: validated, immutable input
//! - [`stage::StageResult`]: one model's outcome in one stage
//! - [`run::PipelineRun`]: append-only record of a run
//! - [`result::PipelineResult`]: wire result handed back to clients
//! - [`event::PipelineEvent`]: progress events published per run

pub mod event;
pub mod request;
pub mod result;
pub mod run;
pub mod stage;
