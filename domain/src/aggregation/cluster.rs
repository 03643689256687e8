//! Greedy suggestion clustering with confidence scoring

use super::normalize::{jaccard, token_set};
use crate::core::model::ModelId;
use crate::util::{first_sentence, truncate_chars};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tunables for [`aggregate`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationParams {
    /// Minimum Jaccard similarity to the representative to join a cluster
    pub similarity_threshold: f64,
    pub base_confidence: f64,
    pub source_weight: f64,
    pub similarity_weight: f64,
    /// Source count at which the source term stops growing
    pub source_saturation: usize,
    /// Character cap of a cluster summary, ellipsis included
    pub summary_max_chars: usize,
}

impl Default for AggregationParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.82,
            base_confidence: 0.25,
            source_weight: 0.5,
            similarity_weight: 0.25,
            source_saturation: 5,
            summary_max_chars: 240,
        }
    }
}

/// One model's contribution to be clustered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub model: ModelId,
    pub text: String,
}

impl Suggestion {
    pub fn new(model: ModelId, text: impl Into<String>) -> Self {
        Self {
            model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionCluster {
    pub id: String,
    pub summary: String,
    /// Contributing models, first-seen order, no duplicates
    pub models: Vec<ModelId>,
    pub merge_count: usize,
    pub confidence: f64,
}

struct Member<'a> {
    suggestion: &'a Suggestion,
    similarity: f64,
}

struct Building<'a> {
    representative: HashSet<String>,
    members: Vec<Member<'a>>,
}

/// Cluster suggestions in input order.
///
/// Each suggestion joins the first existing cluster whose representative
/// (its first member) it matches at or above the threshold, otherwise it
/// starts a new cluster. The result therefore depends on input order.
/// Blank suggestions are ignored.
pub fn aggregate(suggestions: &[Suggestion], params: &AggregationParams) -> Vec<SuggestionCluster> {
    let mut building: Vec<Building<'_>> = Vec::new();

    for suggestion in suggestions {
        let tokens = token_set(&suggestion.text);
        if tokens.is_empty() {
            continue;
        }

        let matched = building.iter_mut().find_map(|cluster| {
            let similarity = jaccard(&cluster.representative, &tokens);
            (similarity >= params.similarity_threshold).then_some((cluster, similarity))
        });

        match matched {
            Some((cluster, similarity)) => cluster.members.push(Member {
                suggestion,
                similarity,
            }),
            None => building.push(Building {
                representative: tokens,
                members: vec![Member {
                    suggestion,
                    similarity: 1.0,
                }],
            }),
        }
    }

    building
        .into_iter()
        .enumerate()
        .map(|(index, cluster)| finish(index + 1, cluster, params))
        .collect()
}

fn finish(number: usize, cluster: Building<'_>, params: &AggregationParams) -> SuggestionCluster {
    let mut models: Vec<ModelId> = Vec::new();
    for member in &cluster.members {
        if !models.contains(&member.suggestion.model) {
            models.push(member.suggestion.model.clone());
        }
    }

    let merge_count = cluster.members.len();
    let mean_similarity =
        cluster.members.iter().map(|m| m.similarity).sum::<f64>() / merge_count as f64;
    let saturation = params.source_saturation.max(1) as f64;
    let source_term = (models.len() as f64 / saturation).min(1.0);
    let confidence = (params.base_confidence
        + params.source_weight * source_term
        + params.similarity_weight * mean_similarity)
        .clamp(0.0, 1.0);

    // Longest member by characters; earliest wins ties.
    let mut longest = cluster.members[0].suggestion.text.as_str();
    for member in &cluster.members[1..] {
        let text = member.suggestion.text.as_str();
        if text.chars().count() > longest.chars().count() {
            longest = text;
        }
    }

    SuggestionCluster {
        id: format!("cluster-{number}"),
        summary: truncate_chars(first_sentence(longest), params.summary_max_chars),
        models,
        merge_count,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(model: &str, text: &str) -> Suggestion {
        Suggestion::new(ModelId::new(model).unwrap(), text)
    }

    fn ids(cluster: &SuggestionCluster) -> Vec<&str> {
        cluster.models.iter().map(|m| m.as_str()).collect()
    }

    #[test]
    fn test_near_duplicates_merge() {
        // 9 shared tokens out of 10 -> Jaccard 0.9
        let a = s("a", "one two three four five six seven eight nine ten");
        let b = s("b", "one two three four five six seven eight nine");
        let clusters = aggregate(&[a, b], &AggregationParams::default());

        assert_eq!(clusters.len(), 1);
        let c = &clusters[0];
        assert_eq!(c.id, "cluster-1");
        assert_eq!(ids(c), vec!["a", "b"]);
        assert_eq!(c.merge_count, 2);
        // 0.25 + 0.5 * 2/5 + 0.25 * (1.0 + 0.9) / 2
        assert!((c.confidence - 0.6875).abs() < 1e-9);
        assert_eq!(c.summary, "one two three four five six seven eight nine ten");
    }

    #[test]
    fn test_distinct_suggestions_stay_apart() {
        let clusters = aggregate(
            &[
                s("a", "Add a cache in front of the database."),
                s("b", "Rewrite the frontend in a different framework."),
            ],
            &AggregationParams::default(),
        );
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[1].id, "cluster-2");
        // single source, self-similarity only
        assert!((clusters[0].confidence - (0.25 + 0.1 + 0.25)).abs() < 1e-9);
    }

    #[test]
    fn test_reaggregating_summaries_is_stable() {
        let params = AggregationParams::default();
        let first = aggregate(
            &[
                s("a", "Add a cache in front of the database"),
                s("b", "add a cache in front of the database."),
                s("c", "Rewrite the frontend in a different framework"),
            ],
            &params,
        );
        assert_eq!(first.len(), 2);

        let summaries: Vec<Suggestion> = first
            .iter()
            .map(|c| Suggestion::new(c.models[0].clone(), c.summary.clone()))
            .collect();
        let second = aggregate(&summaries, &params);

        assert_eq!(second.len(), first.len());
        for (again, original) in second.iter().zip(&first) {
            assert_eq!(again.id, original.id);
            assert_eq!(again.summary, original.summary);
        }
    }

    #[test]
    fn test_bullets_and_case_do_not_matter() {
        let clusters = aggregate(
            &[
                s("a", "- Use connection pooling for the database"),
                s("b", "1. use Connection pooling for the database!"),
            ],
            &AggregationParams::default(),
        );
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_order_sensitivity() {
        let params = AggregationParams {
            similarity_threshold: 0.5,
            ..Default::default()
        };
        let a = s("a", "w1 w2 w3 w4");
        let b = s("b", "w2 w3 w4 w5");
        let c = s("c", "w3 w4 w5 w6");

        // a~b = 0.6, b~c = 0.6, a~c = 0.33
        let abc = aggregate(&[a.clone(), b.clone(), c.clone()], &params);
        assert_eq!(abc.len(), 2);
        assert_eq!(ids(&abc[0]), vec!["a", "b"]);
        assert_eq!(ids(&abc[1]), vec!["c"]);

        let bac = aggregate(&[b, a, c], &params);
        assert_eq!(bac.len(), 1);
        assert_eq!(ids(&bac[0]), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_same_model_counted_once() {
        let clusters = aggregate(
            &[s("a", "retry with backoff"), s("a", "retry with backoff")],
            &AggregationParams::default(),
        );
        assert_eq!(clusters[0].models.len(), 1);
        assert_eq!(clusters[0].merge_count, 2);
    }

    #[test]
    fn test_confidence_grows_with_sources_and_is_clamped() {
        let params = AggregationParams::default();
        let mut previous = 0.0;
        let mut inputs = Vec::new();
        for i in 0..8 {
            inputs.push(s(&format!("m{i}"), "retry with exponential backoff"));
            let c = aggregate(&inputs, &params);
            assert_eq!(c.len(), 1);
            assert!(c[0].confidence >= previous);
            assert!(c[0].confidence <= 1.0);
            previous = c[0].confidence;
        }
        assert!((previous - 1.0).abs() < 1e-9);

        let generous = AggregationParams {
            base_confidence: 0.9,
            ..Default::default()
        };
        let c = aggregate(&inputs, &generous);
        assert_eq!(c[0].confidence, 1.0);
    }

    #[test]
    fn test_summary_first_sentence_truncated() {
        let params = AggregationParams {
            similarity_threshold: 0.0,
            summary_max_chars: 10,
            ..Default::default()
        };
        let clusters = aggregate(
            &[s("a", "Short one."), s("b", "A much longer sentence here. And more.")],
            &params,
        );
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].summary, "A much lo…");
    }

    #[test]
    fn test_blank_input_ignored() {
        let clusters = aggregate(&[s("a", "  \n - "), s("b", "")], &AggregationParams::default());
        assert!(clusters.is_empty());
    }
}
