//! Data models for stored news rows, selection candidates and their scores.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`NewsRow`] / [`ExpertReview`]: what the Store persists
//! - [`RawArticle`]: what a Fetcher yields before it is stored
//! - [`Candidate`]: a stored row under consideration for today's queue
//! - [`ScoredCandidate`]: a candidate that survived filtering, with its derived fields
//! - [`ContentScoreResult`]: the eight-axis content score of one article
//! - [`SelectionReport`]: the summary of one daily selection run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the eight content-scoring dimensions.
///
/// The declaration order is the order used for breakdown maps and for the
/// human-readable explanation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    PolicyHierarchy,
    CorporateHierarchy,
    StrategicIndustry,
    EconomicScale,
    GeographicSignificance,
    TimeSensitivity,
    InternationalImpact,
    SocialImpact,
}

impl Axis {
    pub const ALL: [Axis; 8] = [
        Axis::PolicyHierarchy,
        Axis::CorporateHierarchy,
        Axis::StrategicIndustry,
        Axis::EconomicScale,
        Axis::GeographicSignificance,
        Axis::TimeSensitivity,
        Axis::InternationalImpact,
        Axis::SocialImpact,
    ];

    /// Short label used in score explanations.
    pub fn label(self) -> &'static str {
        match self {
            Axis::PolicyHierarchy => "policy",
            Axis::CorporateHierarchy => "corporate",
            Axis::StrategicIndustry => "industry",
            Axis::EconomicScale => "scale",
            Axis::GeographicSignificance => "geography",
            Axis::TimeSensitivity => "urgency",
            Axis::InternationalImpact => "international",
            Axis::SocialImpact => "social",
        }
    }
}

/// Topic bucket used for quota balancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Policy,
    Macro,
    Industry,
    Energy,
    Finance,
    Corporate,
    Tech,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Policy => "policy",
            Category::Macro => "macro",
            Category::Industry => "industry",
            Category::Energy => "energy",
            Category::Finance => "finance",
            Category::Corporate => "corporate",
            Category::Tech => "tech",
        };
        f.write_str(name)
    }
}

/// Expert-review state of a stored news row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Not queued; eligible for selection.
    #[default]
    None,
    /// Selected into today's review queue.
    QueuedToday,
    /// An expert has written a review.
    Commented,
    /// An expert passed on it.
    Skipped,
}

/// Publication state of an expert review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
    Discarded,
    Rejected,
}

/// An article as yielded by a Fetcher, before it has a Store id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub source: String,
    pub original_url: String,
    pub title: String,
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A persisted news row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRow {
    pub id: i64,
    pub source: String,
    pub original_url: String,
    pub original_title: String,
    #[serde(default)]
    pub original_content: Option<String>,
    /// Produced by the translation collaborator; required before expert review.
    #[serde(default)]
    pub translated_title: Option<String>,
    /// External AI importance score. Carried along, never computed here.
    #[serde(default)]
    pub importance_score: Option<f64>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expert_review_status: ReviewStatus,
    #[serde(default)]
    pub content_score: Option<f64>,
    #[serde(default)]
    pub score_breakdown: Option<BTreeMap<Axis, u32>>,
    #[serde(default)]
    pub score_explanation: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewsRow {
    /// `COALESCE(published_at, collected_at)`.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.collected_at)
    }

    /// Whether this row may enter today's selection.
    ///
    /// Requires completed AI analysis, no review activity yet, a non-blank
    /// translated title and a reference time at or after `cutoff`. Rows
    /// without any timestamp are never eligible.
    pub fn is_eligible(&self, cutoff: DateTime<Utc>) -> bool {
        self.analyzed_at.is_some()
            && self.expert_review_status == ReviewStatus::None
            && self
                .translated_title
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
            && self.reference_time().is_some_and(|t| t >= cutoff)
    }

    /// A fresh, unanalyzed row for a fetched article.
    pub fn from_raw(id: i64, article: &RawArticle, collected_at: DateTime<Utc>) -> Self {
        Self {
            id,
            source: article.source.clone(),
            original_url: article.original_url.clone(),
            original_title: article.title.clone(),
            original_content: Some(article.content.clone()).filter(|c| !c.is_empty()),
            translated_title: None,
            importance_score: None,
            published_at: article.published_at,
            collected_at: Some(collected_at),
            analyzed_at: None,
            expert_review_status: ReviewStatus::None,
            content_score: None,
            score_breakdown: None,
            score_explanation: None,
            updated_at: None,
        }
    }
}

/// A persisted expert review, keyed by the news row it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertReview {
    pub news_id: i64,
    #[serde(default)]
    pub publish_status: PublishStatus,
}

/// A news item under consideration for the daily review queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub collected_at: Option<DateTime<Utc>>,
    pub importance_score: Option<f64>,
    pub translated_title: Option<String>,
}

impl Candidate {
    /// `COALESCE(published_at, collected_at)`.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.collected_at)
    }
}

impl From<NewsRow> for Candidate {
    fn from(row: NewsRow) -> Self {
        Self {
            id: row.id,
            title: row.original_title,
            content: row.original_content.unwrap_or_default(),
            source: row.source,
            published_at: row.published_at,
            collected_at: row.collected_at,
            importance_score: row.importance_score,
            translated_title: row.translated_title,
        }
    }
}

/// Result of one axis scorer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisScore {
    /// Raw 0..=100 score before weighting.
    pub score: u32,
    /// Name of the tier or type that produced the score; empty when nothing matched.
    pub label: String,
    /// Keywords or amounts found in the text, de-duplicated in first-seen order.
    pub evidence: Vec<String>,
}

/// A multiplicative booster that fired for an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedBooster {
    pub name: String,
    pub multiplier: f64,
    pub matched: String,
}

/// The content score of one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentScoreResult {
    /// Final 0..=100 score, rounded to two decimals.
    pub total_score: f64,
    /// Weighted composite before boosters, rounded to two decimals.
    pub weighted_raw: f64,
    /// Compounded booster product actually applied (never above the cap).
    pub multiplier: f64,
    pub breakdown: BTreeMap<Axis, AxisScore>,
    pub boosters: Vec<AppliedBooster>,
    pub explanation: String,
}

impl ContentScoreResult {
    /// Raw score of every axis.
    pub fn axis_scores(&self) -> BTreeMap<Axis, u32> {
        self.breakdown
            .iter()
            .map(|(axis, s)| (*axis, s.score))
            .collect()
    }

    pub fn axis(&self, axis: Axis) -> u32 {
        self.breakdown.get(&axis).map_or(0, |s| s.score)
    }
}

/// A candidate that passed the filter, with every derived field populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub category: Category,
    pub is_domestic: bool,
    pub is_local_gov: bool,
    pub fact_richness: i32,
    pub scope_score: i32,
    pub is_broad: bool,
    /// Source weight + central bonus + domestic bonus + fact richness.
    pub formal_score: f64,
    /// `formal_score` mapped onto 0..=100.
    pub formal_normalized: f64,
    pub content: ContentScoreResult,
    /// The final ranking key. Only comparable within one filter run.
    pub priority_score: f64,
}

impl ScoredCandidate {
    pub fn id(&self) -> i64 {
        self.candidate.id
    }

    pub fn source(&self) -> &str {
        &self.candidate.source
    }

    pub fn content_score(&self) -> f64 {
        self.content.total_score
    }
}

/// Summary of one daily selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub reset_count: usize,
    pub eligible_count: usize,
    pub admitted_count: usize,
    pub selected_count: usize,
    pub updated_count: usize,
    pub selected_ids: Vec<i64>,
    pub category_counts: BTreeMap<Category, usize>,
    pub source_counts: BTreeMap<String, usize>,
    pub rejected: BTreeMap<String, usize>,
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
}
