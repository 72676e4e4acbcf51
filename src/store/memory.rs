//! In-process store backed by a mutex-guarded [`NewsDocument`].

use super::{NewsDocument, NewsStore, SelectionMark};
use crate::error::StoreError;
use crate::models::{Candidate, RawArticle};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<NewsDocument>,
}

impl MemoryStore {
    pub fn new(doc: NewsDocument) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> Result<NewsDocument, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, NewsDocument>, StoreError> {
        self.doc
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl NewsStore for MemoryStore {
    async fn reset_queue(&self, at: DateTime<Utc>) -> Result<usize, StoreError> {
        Ok(self.lock()?.reset_queue(at))
    }

    async fn fetch_eligible_candidates(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.lock()?.eligible_candidates(cutoff))
    }

    async fn load_historical_titles(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.historical_titles())
    }

    async fn mark_selected(
        &self,
        marks: &[SelectionMark],
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        Ok(self.lock()?.mark_selected(marks, at))
    }

    async fn insert_articles(
        &self,
        articles: &[RawArticle],
        collected_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        Ok(self.lock()?.insert_articles(articles, collected_at))
    }
}
