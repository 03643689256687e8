//! Selection policy value object

use serde::{Deserialize, Serialize};

/// How the models of a run are chosen
///
/// - `Manual`: exactly the caller's list
/// - `Premium`: premium-tagged models first, then the most expensive tier
/// - `Speed`: low-latency-tagged models first, then the cheapest
/// - `Budget`: cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    Manual,
    #[default]
    Premium,
    Speed,
    Budget,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::Manual => "manual",
            SelectionPolicy::Premium => "premium",
            SelectionPolicy::Speed => "speed",
            SelectionPolicy::Budget => "budget",
        }
    }

    /// Whether the policy ranks models automatically
    pub fn is_auto(&self) -> bool {
        !matches!(self, SelectionPolicy::Manual)
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(SelectionPolicy::Manual),
            "premium" => Ok(SelectionPolicy::Premium),
            "speed" => Ok(SelectionPolicy::Speed),
            "budget" => Ok(SelectionPolicy::Budget),
            other => Err(format!(
                "Unknown selection policy: {}. Valid: manual, premium, speed, budget",
                other
            )),
        }
    }
}
