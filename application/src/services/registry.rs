//! Model registry service
//!
//! Holds the descriptors of every configured model and keeps their health
//! current by probing them through the [`ModelBackend`] port.

use crate::ports::model_backend::ModelBackend;
use council_domain::{HealthStatus, ModelDescriptor, ModelId};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Model not found: {0}")]
    NotFound(ModelId),
}

/// Registered models in insertion order
pub struct ModelRegistry {
    backend: Arc<dyn ModelBackend>,
    models: RwLock<Vec<ModelDescriptor>>,
}

impl ModelRegistry {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            models: RwLock::new(Vec::new()),
        }
    }

    pub fn with_models(self, models: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        for model in models {
            self.register(model);
        }
        self
    }

    /// Add a model, or replace the descriptor with the same id in place.
    pub fn register(&self, descriptor: ModelDescriptor) {
        let mut models = self.models.write().unwrap_or_else(|e| e.into_inner());
        match models.iter_mut().find(|m| m.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => models.push(descriptor),
        }
    }

    /// Remove a model; returns whether it was registered.
    pub fn deregister(&self, id: &ModelId) -> bool {
        let mut models = self.models.write().unwrap_or_else(|e| e.into_inner());
        let before = models.len();
        models.retain(|m| &m.id != id);
        models.len() != before
    }

    /// Every registered model, in registration order
    pub fn all(&self) -> Vec<ModelDescriptor> {
        self.models.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Models whose health is `ready`, in registration order
    pub fn list_healthy(&self) -> Vec<ModelDescriptor> {
        self.models
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.health.is_ready())
            .cloned()
            .collect()
    }

    pub fn describe(&self, id: &ModelId) -> Result<ModelDescriptor, RegistryError> {
        self.models
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|m| &m.id == id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Overwrite the health of one model; unknown ids are ignored.
    pub fn set_health(&self, id: &ModelId, health: HealthStatus) {
        let mut models = self.models.write().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = models.iter_mut().find(|m| &m.id == id) {
            model.health = health;
        }
    }

    /// Probe every registered model concurrently and record the outcome.
    ///
    /// Only health is written. A model deregistered while its probe was in
    /// flight stays removed. Returns the health recorded per model.
    pub async fn refresh(&self) -> Vec<(ModelId, HealthStatus)> {
        let snapshot = self.all();
        info!("Refreshing health of {} models", snapshot.len());

        let mut join_set = JoinSet::new();
        for descriptor in snapshot {
            let backend = Arc::clone(&self.backend);
            join_set.spawn(async move {
                let outcome = backend.probe(&descriptor).await;
                (descriptor.id, outcome)
            });
        }

        let mut recorded = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((id, Ok(()))) => {
                    debug!("Probe of {} succeeded", id);
                    self.set_health(&id, HealthStatus::Ready);
                    recorded.push((id, HealthStatus::Ready));
                }
                Ok((id, Err(e))) => {
                    warn!("Probe of {} failed: {}", id, e);
                    self.set_health(&id, HealthStatus::Error);
                    recorded.push((id, HealthStatus::Error));
                }
                Err(e) => {
                    warn!("Probe task join error: {}", e);
                }
            }
        }
        recorded
    }

    /// Refresh every `interval` until `cancel` fires.
    ///
    /// The first refresh happens one interval from now; call [`refresh`](Self::refresh)
    /// directly for an immediate one.
    pub fn spawn_periodic_refresh(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let first = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(first, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Periodic registry refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.refresh().await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_backend::BackendError;
    use async_trait::async_trait;
    use council_domain::StagePrompt;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Backend whose probes fail for a configurable set of models
    struct ProbeBackend {
        failing: Mutex<HashSet<String>>,
        probes: Mutex<usize>,
    }

    impl ProbeBackend {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: Mutex::new(failing.iter().map(|s| s.to_string()).collect()),
                probes: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelBackend for ProbeBackend {
        async fn invoke(
            &self,
            _model: &ModelDescriptor,
            _prompt: &StagePrompt,
        ) -> Result<String, BackendError> {
            Ok(String::new())
        }

        async fn probe(&self, model: &ModelDescriptor) -> Result<(), BackendError> {
            *self.probes.lock().unwrap() += 1;
            if self.failing.lock().unwrap().contains(model.id.as_str()) {
                Err(BackendError::Unavailable("down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn id(s: &str) -> ModelId {
        ModelId::new(s).unwrap()
    }

    fn descriptor(name: &str) -> ModelDescriptor {
        ModelDescriptor::new(id(name), "openai", 1.0)
    }

    fn registry(backend: Arc<ProbeBackend>) -> ModelRegistry {
        ModelRegistry::new(backend).with_models([descriptor("a"), descriptor("b"), descriptor("c")])
    }

    #[test]
    fn test_register_replaces_in_place() {
        let reg = registry(Arc::new(ProbeBackend::new(&[])));
        reg.register(ModelDescriptor::new(id("b"), "anthropic", 9.0));

        let all = reg.all();
        let ids: Vec<_> = all.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(all[1].provider, "anthropic");
    }

    #[test]
    fn test_new_models_start_checking() {
        let reg = registry(Arc::new(ProbeBackend::new(&[])));
        assert!(reg.list_healthy().is_empty());
        assert_eq!(reg.describe(&id("a")).unwrap().health, HealthStatus::Checking);
    }

    #[test]
    fn test_describe_unknown() {
        let reg = registry(Arc::new(ProbeBackend::new(&[])));
        assert_eq!(reg.describe(&id("zzz")), Err(RegistryError::NotFound(id("zzz"))));
    }

    #[test]
    fn test_deregister() {
        let reg = registry(Arc::new(ProbeBackend::new(&[])));
        assert!(reg.deregister(&id("a")));
        assert!(!reg.deregister(&id("a")));
        assert_eq!(reg.all().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_marks_health_without_removing() {
        let backend = Arc::new(ProbeBackend::new(&["b"]));
        let reg = registry(Arc::clone(&backend));

        let recorded = reg.refresh().await;
        assert_eq!(recorded.len(), 3);

        let healthy: Vec<_> = reg.list_healthy().into_iter().map(|m| m.id.to_string()).collect();
        assert_eq!(healthy, vec!["a", "c"]);
        assert_eq!(reg.describe(&id("b")).unwrap().health, HealthStatus::Error);
        assert_eq!(reg.all().len(), 3);

        // idempotent
        reg.refresh().await;
        assert_eq!(reg.list_healthy().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_recovers_model() {
        let backend = Arc::new(ProbeBackend::new(&["a"]));
        let reg = registry(Arc::clone(&backend));
        reg.refresh().await;
        assert_eq!(reg.list_healthy().len(), 2);

        backend.failing.lock().unwrap().clear();
        reg.refresh().await;
        assert_eq!(reg.list_healthy().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_refresh_stops_on_cancel() {
        let backend = Arc::new(ProbeBackend::new(&[]));
        let reg = Arc::new(registry(Arc::clone(&backend)));
        let cancel = CancellationToken::new();

        let handle =
            Arc::clone(&reg).spawn_periodic_refresh(Duration::from_secs(10), cancel.clone());
        tokio::time::sleep(Duration::from_secs(25)).await;
        cancel.cancel();
        handle.await.unwrap();

        // ticks at 10s and 20s
        assert_eq!(*backend.probes.lock().unwrap(), 6);
        assert_eq!(reg.list_healthy().len(), 3);
    }
}
