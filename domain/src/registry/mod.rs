//! Model registry domain
//!
//! Descriptors of the backends a council run can draw from. The registry
//! service itself (probing, concurrent refresh) lives in the application
//! layer; this module only defines the data it manages.

pub mod descriptor;
