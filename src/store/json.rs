//! Store persisted as a single JSON document.
//!
//! # File Layout
//!
//! ```text
//! data/
//! └── news.json   {"news": [...], "reviews": [...]}
//! ```
//!
//! Every mutation reads the document, applies the change and writes it
//! back through a sibling temp file that is then renamed over the original,
//! so a crash mid-write leaves the previous document intact. A missing file
//! reads as an empty store.

use super::{NewsDocument, NewsStore, SelectionMark};
use crate::error::StoreError;
use crate::models::{Candidate, RawArticle};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<NewsDocument, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Store file missing; starting empty");
                Ok(NewsDocument::default())
            }
            Err(e) => {
                error!(error = %e, "Failed to read store file");
                Err(e.into())
            }
        }
    }

    /// Replace the document on disk.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn save(&self, doc: &NewsDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(dir).await {
                error!(dir = %dir.display(), error = %e, "Failed to create store dir");
                return Err(e.into());
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(rows = doc.news.len(), "Wrote store file");
        Ok(())
    }

    /// Apply `change` and persist the document if it reports any modified rows.
    async fn update<F>(&self, change: F) -> Result<usize, StoreError>
    where
        F: FnOnce(&mut NewsDocument) -> usize,
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let changed = change(&mut doc);
        if changed > 0 {
            self.save(&doc).await?;
        }
        Ok(changed)
    }
}

impl NewsStore for JsonFileStore {
    async fn reset_queue(&self, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let reset = self.update(|doc| doc.reset_queue(at)).await?;
        info!(reset, "Reset previous queue");
        Ok(reset)
    }

    async fn fetch_eligible_candidates(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.load().await?.eligible_candidates(cutoff))
    }

    async fn load_historical_titles(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load().await?.historical_titles())
    }

    async fn mark_selected(
        &self,
        marks: &[SelectionMark],
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.update(|doc| doc.mark_selected(marks, at)).await
    }

    async fn insert_articles(
        &self,
        articles: &[RawArticle],
        collected_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.update(|doc| doc.insert_articles(articles, collected_at))
            .await
    }
}
