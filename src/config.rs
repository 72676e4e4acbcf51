//! Application configuration loaded from YAML.
//!
//! Every field has a default, so the file is optional and may be partial:
//!
//! ```yaml
//! selection:
//!   target_count: 12
//! rules_path: rules.yaml
//! sources:
//!   - key: 36kr
//!     name: 36氪 (36Kr)
//!     rss: https://36kr.com/feed
//! ```

use crate::error::ConfigError;
use crate::rules::Rules;
use crate::selector::SelectionParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub selection: SelectionConfig,
    /// Rule document replacing the built-in tables.
    pub rules_path: Option<PathBuf>,
    pub sources: Vec<SourceConfig>,
    pub ingest: IngestConfig,
}

/// One year; older items are never review candidates.
const MAX_FRESHNESS_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub target_count: usize,
    pub max_local_gov: usize,
    pub freshness_hours: i64,
    pub dedup_enabled: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            target_count: 10,
            max_local_gov: 1,
            freshness_hours: 24,
            dedup_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub key: String,
    pub name: String,
    pub rss: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_items_per_source: usize,
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
    /// A title must contain one of these to be stored.
    pub relevance_keywords: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_items_per_source: 20,
            max_retries: 3,
            base_delay_ms: 500,
            timeout_secs: 15,
            relevance_keywords: [
                "经济", "产业", "科技", "创新", "发展", "投资", "市场", "企业", "公司", "政策",
                "规划", "制造", "工业", "数字", "技术", "智能", "绿色", "高质量", "改革", "金融",
                "半导体", "芯片", "人工智能", "新能源", "电池", "汽车", "机器人", "央行", "利率",
                "出口", "消费", "融资", "上市",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            key: "36kr".to_string(),
            name: "36氪 (36Kr)".to_string(),
            rss: "https://36kr.com/feed".to_string(),
            enabled: true,
        },
        SourceConfig {
            key: "huxiu".to_string(),
            name: "虎嗅 (Huxiu)".to_string(),
            rss: "https://www.huxiu.com/rss/0.xml".to_string(),
            enabled: true,
        },
    ]
}

impl AppConfig {
    /// Parse and validate a YAML document. An absent `sources` list means
    /// the built-in feeds.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        if config.sources.is_empty() {
            config.sources = default_sources();
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the defaults when no path is given.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                let config = Self::from_yaml_str(&raw)?;
                info!(sources = config.sources.len(), "Loaded configuration");
                Ok(config)
            }
            None => Self::from_yaml_str(""),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.target_count == 0 {
            return Err(ConfigError::Invalid("selection.target_count must be at least 1".into()));
        }
        if !(1..=MAX_FRESHNESS_HOURS).contains(&self.selection.freshness_hours) {
            return Err(ConfigError::Invalid(format!(
                "selection.freshness_hours must be between 1 and {MAX_FRESHNESS_HOURS}"
            )));
        }
        if self.ingest.max_items_per_source == 0 {
            return Err(ConfigError::Invalid("ingest.max_items_per_source must be at least 1".into()));
        }
        if let Some(bad) = self.sources.iter().find(|s| s.key.trim().is_empty() || s.rss.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "source {:?} needs both a key and an rss url",
                bad.name
            )));
        }
        Ok(())
    }

    /// Rule tables named by `rules_path`, or the built-in ones.
    pub fn rules(&self) -> Result<Rules, ConfigError> {
        Rules::load(self.rules_path.as_deref())
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    pub fn selection_params(&self, dry_run: bool) -> SelectionParams {
        SelectionParams {
            target_count: self.selection.target_count,
            max_local_gov: self.selection.max_local_gov,
            freshness_hours: self.selection.freshness_hours,
            dry_run,
        }
    }
}
