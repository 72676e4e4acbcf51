//! The persistence collaborator.
//!
//! [`NewsStore`] is the seam the orchestrator and the ingest step talk to.
//! Both implementations keep the same [`NewsDocument`] shape and share its
//! query and mutation logic:
//!
//! - [`MemoryStore`]: a mutex around a document, for tests and dry runs
//! - [`JsonFileStore`]: a document persisted as one JSON file

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{
    Axis, Candidate, ExpertReview, NewsRow, PublishStatus, RawArticle, ReviewStatus,
    ScoredCandidate,
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// What the orchestrator writes back for one selected row.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionMark {
    pub id: i64,
    pub content_score: f64,
    pub breakdown: BTreeMap<Axis, u32>,
    pub explanation: String,
}

impl From<&ScoredCandidate> for SelectionMark {
    fn from(c: &ScoredCandidate) -> Self {
        Self {
            id: c.id(),
            content_score: c.content_score(),
            breakdown: c.content.axis_scores(),
            explanation: c.content.explanation.clone(),
        }
    }
}

/// Read and write access to news rows and their review state.
pub trait NewsStore {
    /// Return every `queued_today` row to `none`. Returns the number of rows reset.
    async fn reset_queue(&self, at: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Rows eligible for today's queue, most recent first.
    async fn fetch_eligible_candidates(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Candidate>, StoreError>;

    /// Titles of skipped, discarded, rejected, published and drafted rows.
    async fn load_historical_titles(&self) -> Result<Vec<String>, StoreError>;

    /// Queue the marked rows and persist their scores. Returns the number of rows updated.
    async fn mark_selected(
        &self,
        marks: &[SelectionMark],
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Insert articles whose URL is not stored yet. Returns the number inserted.
    async fn insert_articles(
        &self,
        articles: &[RawArticle],
        collected_at: DateTime<Utc>,
    ) -> Result<usize, StoreError>;
}

/// The complete persisted state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsDocument {
    pub news: Vec<NewsRow>,
    pub reviews: Vec<ExpertReview>,
}

impl NewsDocument {
    pub fn reset_queue(&mut self, at: DateTime<Utc>) -> usize {
        let mut reset = 0;
        for row in &mut self.news {
            if row.expert_review_status == ReviewStatus::QueuedToday {
                row.expert_review_status = ReviewStatus::None;
                row.updated_at = Some(at);
                reset += 1;
            }
        }
        reset
    }

    pub fn eligible_candidates(&self, cutoff: DateTime<Utc>) -> Vec<Candidate> {
        self.news
            .iter()
            .filter(|row| row.is_eligible(cutoff))
            .sorted_by(|a, b| b.reference_time().cmp(&a.reference_time()))
            .cloned()
            .map(Candidate::from)
            .collect()
    }

    pub fn historical_titles(&self) -> Vec<String> {
        let titles: HashMap<i64, &str> = self
            .news
            .iter()
            .map(|row| (row.id, row.original_title.as_str()))
            .collect();
        let reviewed_with = |statuses: &[PublishStatus]| {
            self.reviews
                .iter()
                .filter(|r| statuses.contains(&r.publish_status))
                .filter_map(|r| titles.get(&r.news_id).copied())
                .collect::<Vec<_>>()
        };

        let skipped = self
            .news
            .iter()
            .filter(|row| row.expert_review_status == ReviewStatus::Skipped)
            .map(|row| row.original_title.as_str());
        let discarded = reviewed_with(&[PublishStatus::Discarded, PublishStatus::Rejected]);
        let reviewed = reviewed_with(&[PublishStatus::Published, PublishStatus::Draft]);

        skipped
            .chain(discarded)
            .chain(reviewed)
            .unique()
            .map(str::to_string)
            .collect()
    }

    pub fn mark_selected(&mut self, marks: &[SelectionMark], at: DateTime<Utc>) -> usize {
        let by_id: HashMap<i64, &SelectionMark> = marks.iter().map(|m| (m.id, m)).collect();
        let mut updated = 0;
        for row in &mut self.news {
            let Some(mark) = by_id.get(&row.id) else {
                continue;
            };
            row.expert_review_status = ReviewStatus::QueuedToday;
            row.content_score = Some(mark.content_score);
            row.score_breakdown = Some(mark.breakdown.clone());
            row.score_explanation = Some(mark.explanation.clone());
            row.updated_at = Some(at);
            updated += 1;
        }
        updated
    }

    pub fn insert_articles(&mut self, articles: &[RawArticle], collected_at: DateTime<Utc>) -> usize {
        let mut known: HashSet<String> = self.news.iter().map(|r| r.original_url.clone()).collect();
        let mut next_id = self.news.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut inserted = 0;

        for article in articles {
            if !known.insert(article.original_url.clone()) {
                continue;
            }
            self.news.push(NewsRow::from_raw(next_id, article, collected_at));
            next_id += 1;
            inserted += 1;
        }
        inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    fn raw(url: &str, title: &str) -> RawArticle {
        RawArticle {
            source: "36kr".to_string(),
            original_url: url.to_string(),
            title: title.to_string(),
            content: "正文".to_string(),
            published_at: Some(now() - Duration::hours(1)),
        }
    }

    #[test]
    fn insert_ignores_known_urls() {
        let mut doc = NewsDocument::default();
        let n = doc.insert_articles(&[raw("u1", "a"), raw("u2", "b"), raw("u1", "a again")], now());
        assert_eq!(n, 2);
        assert_eq!(doc.insert_articles(&[raw("u2", "b")], now()), 0);
        let ids: Vec<i64> = doc.news.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(doc.news[0].collected_at, Some(now()));
    }

    #[test]
    fn eligible_rows_come_back_newest_first() {
        let mut doc = NewsDocument::default();
        doc.insert_articles(&[raw("u1", "a"), raw("u2", "b")], now());
        for row in &mut doc.news {
            row.analyzed_at = Some(now());
            row.translated_title = Some("译".to_string());
        }
        doc.news[1].published_at = Some(now() - Duration::minutes(5));

        let eligible = doc.eligible_candidates(now() - Duration::hours(24));
        let ids: Vec<i64> = eligible.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1]);

        // Not yet analyzed.
        doc.news[0].analyzed_at = None;
        assert_eq!(doc.eligible_candidates(now() - Duration::hours(24)).len(), 1);
    }

    #[test]
    fn historical_titles_cover_skipped_and_reviewed() {
        let mut doc = NewsDocument::default();
        doc.insert_articles(
            &[raw("u1", "skipped"), raw("u2", "discarded"), raw("u3", "published"), raw("u4", "fresh")],
            now(),
        );
        doc.news[0].expert_review_status = ReviewStatus::Skipped;
        doc.reviews = vec![
            ExpertReview {
                news_id: 3,
                publish_status: PublishStatus::Published,
            },
            ExpertReview {
                news_id: 2,
                publish_status: PublishStatus::Discarded,
            },
        ];
        assert_eq!(doc.historical_titles(), vec!["skipped", "discarded", "published"]);
    }

    #[test]
    fn mark_and_reset_round_trip() {
        let mut doc = NewsDocument::default();
        doc.insert_articles(&[raw("u1", "a"), raw("u2", "b")], now());
        let mark = SelectionMark {
            id: 2,
            content_score: 55.5,
            breakdown: BTreeMap::from([(Axis::PolicyHierarchy, 95)]),
            explanation: "policy/国务院(23.8) = total 23.8".to_string(),
        };
        assert_eq!(doc.mark_selected(&[mark], now()), 1);
        let row = &doc.news[1];
        assert_eq!(row.expert_review_status, ReviewStatus::QueuedToday);
        assert_eq!(row.content_score, Some(55.5));
        assert_eq!(row.updated_at, Some(now()));
        // Selection never stamps an analysis time.
        assert_eq!(row.analyzed_at, None);

        assert_eq!(doc.reset_queue(now()), 1);
        assert_eq!(doc.news[1].expert_review_status, ReviewStatus::None);
        assert_eq!(doc.reset_queue(now()), 0);
    }

    #[test]
    fn marks_for_unknown_ids_are_ignored() {
        let mut doc = NewsDocument::default();
        let mark = SelectionMark {
            id: 42,
            content_score: 0.0,
            breakdown: BTreeMap::new(),
            explanation: String::new(),
        };
        assert_eq!(doc.mark_selected(&[mark], now()), 0);
    }
}
