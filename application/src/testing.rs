//! Scripted collaborators shared by the use-case tests

use crate::ports::events::EventPublisher;
use crate::ports::model_backend::{BackendError, ModelBackend};
use async_trait::async_trait;
use council_domain::{ModelDescriptor, PipelineEvent, StagePrompt};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    Delayed(Duration, String),
    Hang,
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system: String,
    pub user: String,
}

/// Backend answering from per-model reply queues
///
/// Models without a queued reply answer `"<model> answer"`.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, model: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.model == model).count()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn invoke(
        &self,
        model: &ModelDescriptor,
        prompt: &StagePrompt,
    ) -> Result<String, BackendError> {
        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(model.id.as_str())
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Reply::Text(format!("{} answer", model.id)));
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.id.to_string(),
            system: prompt.system.clone(),
            user: prompt.user.clone(),
        });

        match reply {
            Reply::Text(t) => Ok(t),
            Reply::Fail(e) => Err(BackendError::RequestFailed(e)),
            Reply::Delayed(delay, t) => {
                tokio::time::sleep(delay).await;
                Ok(t)
            }
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn probe(&self, _model: &ModelDescriptor) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Publisher that keeps every event
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<(String, PipelineEvent)>>,
    begun: Mutex<Vec<String>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self, correlation_id: &str) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == correlation_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn names(&self, correlation_id: &str) -> Vec<&'static str> {
        self.events(correlation_id).iter().map(|e| e.name()).collect()
    }

    /// How many runs have begun on `correlation_id`
    pub fn begins(&self, correlation_id: &str) -> usize {
        self.begun.lock().unwrap().iter().filter(|id| *id == correlation_id).count()
    }
}

impl EventPublisher for RecordingEvents {
    fn begin(&self, correlation_id: &str) {
        self.begun.lock().unwrap().push(correlation_id.to_string());
    }

    fn publish(&self, correlation_id: &str, event: PipelineEvent) {
        self.events
            .lock()
            .unwrap()
            .push((correlation_id.to_string(), event));
    }
}
