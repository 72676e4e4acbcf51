//! Keyword and rule tables driving scoring, filtering and selection.
//!
//! The tables are plain data. They are built once at start-up (either from
//! the built-in defaults or from a YAML document) and handed to the
//! [`ContentScorer`](crate::scorer::ContentScorer),
//! [`NewsFilter`](crate::filter::NewsFilter) and
//! [`CategoryBalancer`](crate::balancer::CategoryBalancer) constructors.
//! Nothing in here is global or mutable.
//!
//! # Layout
//!
//! | Table | Module | Used by |
//! |-------|--------|---------|
//! | [`ScoringRules`] | [`scoring`] | content scorer (8 axes, boosters) |
//! | [`FilterRules`] | [`filter`] | admissibility gate, priority score, dedup |
//! | [`BalanceRules`] | [`filter`] | category balancer caps and ordering |

pub mod filter;
pub mod scoring;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

pub use filter::{BalanceRules, CategoryKeywords, DedupRules, FilterRules};
pub use scoring::{AxisWeights, KeywordBooster, ScoringRules};

/// The complete rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub scoring: ScoringRules,
    pub filter: FilterRules,
    pub balance: BalanceRules,
}

impl Rules {
    /// Parse a YAML rule document. Missing sections fall back to defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load rules from `path`, or the built-in tables when no path is given.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                let rules = Self::from_yaml_str(&raw)?;
                info!("Loaded rule tables from file");
                Ok(rules)
            }
            None => Ok(Self::default()),
        }
    }
}

/// One rung of a tiered keyword table: any keyword hit yields `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub score: u32,
    pub name: String,
    pub keywords: Vec<String>,
}

impl Tier {
    pub(crate) fn new(score: u32, name: &str, keywords: &[&str]) -> Self {
        Self {
            score,
            name: name.to_string(),
            keywords: words(keywords),
        }
    }
}

pub(crate) fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
