//! Model selection domain
//!
//! Given a [`SelectionPolicy`] and the registry's candidates, decide which
//! models take part in a run. Ranking is deterministic: ties always fall back
//! to registration order so the same registry state yields the same choice.

pub mod policy;
pub mod strategy;

pub use policy::SelectionPolicy;
pub use strategy::{MIN_MODELS, SelectionError, rank, resolve_ultra, select};
