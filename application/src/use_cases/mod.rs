//! Use cases (application services)

pub mod execute_stage;
pub mod run_pipeline;
