//! The fetcher collaborator and the ingest step.
//!
//! A [`Fetcher`] yields raw articles for one source. [`RetryFetch`] wraps
//! any fetcher with exponential backoff and jitter. [`ingest`] runs every
//! fetcher, keeps economically relevant titles, drops repeated URLs and
//! stores what is new.
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), 30s) + random_jitter(0..=250ms)
//! ```

pub mod rss;

pub use rss::RssFetcher;

use crate::error::{FetchError, StoreError};
use crate::models::RawArticle;
use crate::store::NewsStore;
use crate::utils::contains_any;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::{Rng, rng};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// A source of raw articles.
pub trait Fetcher {
    /// Source key stored on every article, e.g. `36kr`.
    fn source(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<RawArticle>, FetchError>;
}

/// Retrying decorator around any [`Fetcher`].
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T: Fetcher> RetryFetch<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        self.base_delay.saturating_mul(1 << shift).min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: Fetcher> Fetcher for RetryFetch<T> {
    fn source(&self) -> &str {
        self.inner.source()
    }

    #[instrument(level = "info", skip_all, fields(source = %self.inner.source()))]
    async fn fetch(&self) -> Result<Vec<RawArticle>, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch().await {
                Ok(articles) => return Ok(articles),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + StdDuration::from_millis(jitter_ms);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "fetch() failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Per-source ingest counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceIngest {
    /// Relevant, URL-unique items fetched.
    pub collected: usize,
    /// Items that were not stored before.
    pub new: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub total: usize,
    pub new: usize,
    pub sources: BTreeMap<String, SourceIngest>,
    /// Sources whose fetch failed and were skipped.
    pub failed: Vec<String>,
}

/// Whether `title` mentions any economic relevance keyword.
pub fn is_relevant<S: AsRef<str>>(title: &str, keywords: &[S]) -> bool {
    contains_any(title, keywords)
}

/// Fetch every source and store what is new.
///
/// A failing source is logged and skipped. Store failures abort the ingest.
#[instrument(level = "info", skip_all, fields(sources = fetchers.len()))]
pub async fn ingest<F, S>(
    fetchers: &[F],
    store: &S,
    relevance_keywords: &[String],
    collected_at: DateTime<Utc>,
) -> Result<IngestSummary, StoreError>
where
    F: Fetcher,
    S: NewsStore,
{
    let mut summary = IngestSummary::default();

    // Sources are fetched concurrently; store writes stay sequential.
    let results = join_all(
        fetchers
            .iter()
            .map(|f| async move { (f.source().to_string(), f.fetch().await) }),
    )
    .await;

    for (source, result) in results {
        let fetched = match result {
            Ok(articles) => articles,
            Err(e) => {
                error!(%source, error = %e, "Source fetch failed; skipping");
                summary.failed.push(source);
                continue;
            }
        };

        let mut seen = HashSet::new();
        let items: Vec<RawArticle> = fetched
            .into_iter()
            .filter(|a| is_relevant(&a.title, relevance_keywords))
            .filter(|a| seen.insert(a.original_url.clone()))
            .collect();

        let new = store.insert_articles(&items, collected_at).await?;
        info!(%source, collected = items.len(), new, "Ingested source");

        summary.total += items.len();
        summary.new += new;
        summary.sources.insert(
            source,
            SourceIngest {
                collected: items.len(),
                new,
            },
        );
    }

    info!(total = summary.total, new = summary.new, failed = summary.failed.len(), "Ingest complete");
    Ok(summary)
}
