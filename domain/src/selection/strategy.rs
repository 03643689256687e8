//! Selection strategy: deterministic ranking and minimum-quorum enforcement

use super::policy::SelectionPolicy;
use crate::core::model::ModelId;
use crate::registry::descriptor::{CAPABILITY_LOW_LATENCY, CAPABILITY_PREMIUM, ModelDescriptor};
use thiserror::Error;

/// Fewest distinct models a run may start with.
pub const MIN_MODELS: usize = 2;

/// Errors raised while choosing the models of a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Unknown model: {0}")]
    UnknownModel(ModelId),

    #[error("Manual selection requires at least one requested model")]
    NothingRequested,

    #[error("Insufficient models: {available} healthy and permitted, {required} required")]
    InsufficientModels { available: usize, required: usize },
}

impl SelectionError {
    pub fn code(&self) -> &'static str {
        match self {
            SelectionError::UnknownModel(_) => "UNKNOWN_MODEL",
            SelectionError::NothingRequested => "VALIDATION_ERROR",
            SelectionError::InsufficientModels { .. } => "INSUFFICIENT_MODELS",
        }
    }
}

/// Choose the models for a run.
///
/// `candidates` are all registered models in registration order; only those
/// with `ready` health for which `permitted` returns true are eligible.
/// Auto policies intersect with `requested` when it is non-empty, rank and
/// keep the top `top_k`. Manual returns the requested, eligible subset in
/// request order and rejects ids the registry does not know.
pub fn select<F>(
    policy: SelectionPolicy,
    requested: &[ModelId],
    candidates: &[ModelDescriptor],
    permitted: F,
    top_k: usize,
) -> Result<Vec<ModelDescriptor>, SelectionError>
where
    F: Fn(&ModelId) -> bool,
{
    let eligible = |d: &ModelDescriptor| d.health.is_ready() && permitted(&d.id);

    let chosen: Vec<ModelDescriptor> = match policy {
        SelectionPolicy::Manual => {
            if requested.is_empty() {
                return Err(SelectionError::NothingRequested);
            }
            let mut chosen: Vec<ModelDescriptor> = Vec::new();
            for id in requested {
                let descriptor = candidates
                    .iter()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| SelectionError::UnknownModel(id.clone()))?;
                if chosen.iter().any(|c| &c.id == id) {
                    continue;
                }
                if eligible(descriptor) {
                    chosen.push(descriptor.clone());
                }
            }
            chosen
        }
        _ => {
            let pool: Vec<&ModelDescriptor> = candidates
                .iter()
                .filter(|d| eligible(*d))
                .filter(|d| requested.is_empty() || requested.contains(&d.id))
                .collect();
            rank(policy, pool)
                .into_iter()
                .take(top_k.max(MIN_MODELS))
                .cloned()
                .collect()
        }
    };

    if chosen.len() < MIN_MODELS {
        return Err(SelectionError::InsufficientModels {
            available: chosen.len(),
            required: MIN_MODELS,
        });
    }
    Ok(chosen)
}

/// Order candidates by the policy's preference.
///
/// Uses a stable sort, so equal keys keep their incoming (registration) order.
pub fn rank(policy: SelectionPolicy, mut pool: Vec<&ModelDescriptor>) -> Vec<&ModelDescriptor> {
    match policy {
        SelectionPolicy::Manual => {}
        SelectionPolicy::Budget => {
            pool.sort_by(|a, b| a.cost_per_1k_tokens.total_cmp(&b.cost_per_1k_tokens));
        }
        SelectionPolicy::Premium => {
            pool.sort_by(|a, b| {
                b.has_capability(CAPABILITY_PREMIUM)
                    .cmp(&a.has_capability(CAPABILITY_PREMIUM))
                    .then(b.cost_per_1k_tokens.total_cmp(&a.cost_per_1k_tokens))
            });
        }
        SelectionPolicy::Speed => {
            pool.sort_by(|a, b| {
                b.has_capability(CAPABILITY_LOW_LATENCY)
                    .cmp(&a.has_capability(CAPABILITY_LOW_LATENCY))
                    .then(a.cost_per_1k_tokens.total_cmp(&b.cost_per_1k_tokens))
            });
        }
    }
    pool
}

/// Resolve an explicit ultra (synthesis) model override.
///
/// Returns `Ok(None)` when no override was given or when the requested model
/// is registered but currently unusable; the caller then falls back to its
/// default choice. Unregistered ids are rejected.
pub fn resolve_ultra<F>(
    requested: Option<&ModelId>,
    candidates: &[ModelDescriptor],
    permitted: F,
) -> Result<Option<ModelDescriptor>, SelectionError>
where
    F: Fn(&ModelId) -> bool,
{
    let Some(id) = requested else {
        return Ok(None);
    };
    let descriptor = candidates
        .iter()
        .find(|c| &c.id == id)
        .ok_or_else(|| SelectionError::UnknownModel(id.clone()))?;
    if descriptor.health.is_ready() && permitted(&descriptor.id) {
        Ok(Some(descriptor.clone()))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::descriptor::HealthStatus;

    fn id(s: &str) -> ModelId {
        ModelId::new(s).unwrap()
    }

    fn ready(name: &str, cost: f64) -> ModelDescriptor {
        ModelDescriptor::new(id(name), "openai", cost).with_health(HealthStatus::Ready)
    }

    fn ids(models: &[ModelDescriptor]) -> Vec<&str> {
        models.iter().map(|m| m.id.as_str()).collect()
    }

    fn allow_all(_: &ModelId) -> bool {
        true
    }

    #[test]
    fn test_budget_orders_by_cost() {
        let candidates = vec![ready("b", 5.0), ready("a", 1.0)];
        let chosen = select(SelectionPolicy::Budget, &[], &candidates, allow_all, 2).unwrap();
        assert_eq!(ids(&chosen), vec!["a", "b"]);
    }

    #[test]
    fn test_single_healthy_model_is_insufficient() {
        let candidates = vec![
            ready("a", 1.0),
            ModelDescriptor::new(id("b"), "openai", 5.0).with_health(HealthStatus::Error),
        ];
        let err = select(SelectionPolicy::Budget, &[], &candidates, allow_all, 2).unwrap_err();
        assert_eq!(
            err,
            SelectionError::InsufficientModels {
                available: 1,
                required: 2
            }
        );
        assert_eq!(err.code(), "INSUFFICIENT_MODELS");
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let candidates = vec![ready("x", 2.0), ready("y", 2.0), ready("z", 2.0)];
        let chosen = select(SelectionPolicy::Budget, &[], &candidates, allow_all, 3).unwrap();
        assert_eq!(ids(&chosen), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_top_k_truncates() {
        let candidates = vec![ready("a", 3.0), ready("b", 1.0), ready("c", 2.0)];
        let chosen = select(SelectionPolicy::Budget, &[], &candidates, allow_all, 2).unwrap();
        assert_eq!(ids(&chosen), vec!["b", "c"]);
    }

    #[test]
    fn test_premium_prefers_tag_then_cost() {
        let candidates = vec![
            ready("cheap", 0.5),
            ready("pricey", 20.0),
            ready("tagged", 3.0).with_capability(CAPABILITY_PREMIUM),
        ];
        let chosen = select(SelectionPolicy::Premium, &[], &candidates, allow_all, 3).unwrap();
        assert_eq!(ids(&chosen), vec!["tagged", "pricey", "cheap"]);
    }

    #[test]
    fn test_speed_prefers_low_latency() {
        let candidates = vec![
            ready("slow-cheap", 0.1),
            ready("fast", 4.0).with_capability(CAPABILITY_LOW_LATENCY),
            ready("slow-mid", 1.0),
        ];
        let chosen = select(SelectionPolicy::Speed, &[], &candidates, allow_all, 2).unwrap();
        assert_eq!(ids(&chosen), vec!["fast", "slow-cheap"]);
    }

    #[test]
    fn test_breaker_denied_models_are_excluded() {
        let candidates = vec![ready("a", 1.0), ready("b", 2.0), ready("c", 3.0)];
        let chosen = select(
            SelectionPolicy::Budget,
            &[],
            &candidates,
            |m: &ModelId| m.as_str() != "a",
            3,
        )
        .unwrap();
        assert_eq!(ids(&chosen), vec!["b", "c"]);
    }

    #[test]
    fn test_auto_intersects_requested() {
        let candidates = vec![ready("a", 1.0), ready("b", 2.0), ready("c", 3.0)];
        let requested = vec![id("c"), id("a"), id("missing")];
        let chosen =
            select(SelectionPolicy::Budget, &requested, &candidates, allow_all, 3).unwrap();
        assert_eq!(ids(&chosen), vec!["a", "c"]);
    }

    #[test]
    fn test_manual_returns_requested_order() {
        let candidates = vec![ready("a", 1.0), ready("b", 2.0), ready("c", 3.0)];
        let requested = vec![id("c"), id("a"), id("c")];
        let chosen =
            select(SelectionPolicy::Manual, &requested, &candidates, allow_all, 1).unwrap();
        assert_eq!(ids(&chosen), vec!["c", "a"]);
    }

    #[test]
    fn test_manual_rejects_unknown() {
        let candidates = vec![ready("a", 1.0), ready("b", 2.0)];
        let requested = vec![id("a"), id("zzz")];
        let err =
            select(SelectionPolicy::Manual, &requested, &candidates, allow_all, 3).unwrap_err();
        assert_eq!(err, SelectionError::UnknownModel(id("zzz")));
    }

    #[test]
    fn test_manual_requires_ids() {
        let candidates = vec![ready("a", 1.0), ready("b", 2.0)];
        let err = select(SelectionPolicy::Manual, &[], &candidates, allow_all, 3).unwrap_err();
        assert_eq!(err, SelectionError::NothingRequested);
    }

    #[test]
    fn test_manual_drops_unhealthy_and_enforces_minimum() {
        let candidates = vec![
            ready("a", 1.0),
            ModelDescriptor::new(id("b"), "openai", 2.0),
        ];
        let requested = vec![id("a"), id("b")];
        let err =
            select(SelectionPolicy::Manual, &requested, &candidates, allow_all, 3).unwrap_err();
        assert!(matches!(err, SelectionError::InsufficientModels { available: 1, .. }));
    }

    #[test]
    fn test_resolve_ultra() {
        let candidates = vec![ready("a", 1.0), ModelDescriptor::new(id("b"), "openai", 2.0)];
        assert_eq!(resolve_ultra(None, &candidates, allow_all), Ok(None));
        assert_eq!(
            resolve_ultra(Some(&id("a")), &candidates, allow_all)
                .unwrap()
                .map(|d| d.id),
            Some(id("a"))
        );
        // registered but not ready: fall back
        assert_eq!(resolve_ultra(Some(&id("b")), &candidates, allow_all), Ok(None));
        assert_eq!(
            resolve_ultra(Some(&id("nope")), &candidates, allow_all),
            Err(SelectionError::UnknownModel(id("nope")))
        );
    }
}
