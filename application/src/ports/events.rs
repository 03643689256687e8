//! Event publication port
//!
//! The orchestrator reports progress through this interface. Publishing
//! must not block and must not fail when nobody is listening.

use council_domain::PipelineEvent;

pub trait EventPublisher: Send + Sync {
    /// A new run takes `correlation_id`; called once before its first event.
    ///
    /// A stream left closed by an earlier run with the same id must be
    /// replaced so the new run's events are not dropped.
    fn begin(&self, _correlation_id: &str) {}

    /// Emit `event` on the stream of run `correlation_id`.
    fn publish(&self, correlation_id: &str, event: PipelineEvent);
}
