//! Event hub: per-run event channels with replay
//!
//! Every run gets a channel keyed by correlation id. Published events are
//! appended to the channel's history and fanned out to live subscribers
//! over unbounded queues, so publishing never blocks. A subscriber first
//! receives `connected`, then the history so far, then live events. The
//! terminal event closes the channel; closed channels are kept for the
//! retention window so late subscribers still get the full sequence. A new
//! run on a retained id starts from an empty channel.

use council_application::ports::events::EventPublisher;
use council_domain::{EventEnvelope, PipelineEvent};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

/// Stream handed to subscribers; ends after the run's terminal event
pub type EventStream = UnboundedReceiverStream<EventEnvelope>;

struct Channel {
    history: Vec<EventEnvelope>,
    subscribers: Vec<mpsc::UnboundedSender<EventEnvelope>>,
    last_sequence: u64,
    created_at: Instant,
    closed_at: Option<Instant>,
}

impl Channel {
    fn new() -> Self {
        Self {
            history: Vec::new(),
            subscribers: Vec::new(),
            last_sequence: 0,
            created_at: Instant::now(),
            closed_at: None,
        }
    }

    /// Closed past retention, or subscribed to by a run that never started
    fn expired(&self, now: Instant, retention: Duration) -> bool {
        match self.closed_at {
            Some(closed) => now.duration_since(closed) >= retention,
            None => self.history.is_empty() && now.duration_since(self.created_at) >= retention,
        }
    }
}

pub struct EventHub {
    channels: Mutex<HashMap<String, Channel>>,
    retention: Duration,
}

impl EventHub {
    /// `retention` is how long a closed channel stays available for replay.
    pub fn new(retention: Duration) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// Subscribe to the events of run `correlation_id`.
    ///
    /// Subscribing before the run starts is allowed; events are delivered
    /// as they are published.
    pub fn subscribe(&self, correlation_id: &str) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Self::prune_locked(&mut channels, self.retention);
        let channel = channels
            .entry(correlation_id.to_string())
            .or_insert_with(Channel::new);

        // Receiver is alive right here, so these sends cannot fail.
        let _ = tx.send(EventEnvelope {
            correlation_id: correlation_id.to_string(),
            sequence: 0,
            event: PipelineEvent::Connected,
        });
        for envelope in &channel.history {
            let _ = tx.send(envelope.clone());
        }

        if channel.closed_at.is_none() {
            channel.subscribers.push(tx);
        } else {
            debug!("Replayed closed channel {}", correlation_id);
        }
        UnboundedReceiverStream::new(rx)
    }

    /// Drop a channel immediately; returns whether it existed.
    pub fn release(&self, correlation_id: &str) -> bool {
        self.channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(correlation_id)
            .is_some()
    }

    /// Remove closed channels older than the retention window, and channels
    /// whose run never started within it.
    pub fn prune(&self) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Self::prune_locked(&mut channels, self.retention)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn prune_locked(channels: &mut HashMap<String, Channel>, retention: Duration) -> usize {
        let now = Instant::now();
        let before = channels.len();
        channels.retain(|_, c| !c.expired(now, retention));
        let removed = before - channels.len();
        if removed > 0 {
            debug!("Pruned {} event channels", removed);
        }
        removed
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl EventPublisher for EventHub {
    fn begin(&self, correlation_id: &str) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Self::prune_locked(&mut channels, self.retention);
        if let Some(channel) = channels.get_mut(correlation_id)
            && channel.closed_at.is_some()
        {
            debug!("Reopening event channel {}", correlation_id);
            *channel = Channel::new();
        }
    }

    fn publish(&self, correlation_id: &str, event: PipelineEvent) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let channel = channels
            .entry(correlation_id.to_string())
            .or_insert_with(Channel::new);

        if channel.closed_at.is_some() {
            warn!(
                "Dropping {} event for closed run {}",
                event.name(),
                correlation_id
            );
            return;
        }

        let terminal = event.is_terminal();
        channel.last_sequence += 1;
        let envelope = EventEnvelope {
            correlation_id: correlation_id.to_string(),
            sequence: channel.last_sequence,
            event,
        };

        channel
            .subscribers
            .retain(|tx| tx.send(envelope.clone()).is_ok());
        channel.history.push(envelope);

        if terminal {
            channel.closed_at = Some(Instant::now());
            // Dropping the senders ends every subscriber's stream.
            channel.subscribers.clear();
            debug!("Closed event channel {}", correlation_id);
            Self::prune_locked(&mut channels, self.retention);
        }
    }
}
