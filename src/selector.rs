//! Daily selection run.
//!
//! ```text
//! RESET -> FETCH -> FILTER -> BALANCE -> PERSIST -> REPORT
//! ```
//!
//! Only Store failures abort a run; they surface as [`SelectionError`]. An
//! empty selection is a normal outcome and is reported with a warning. In
//! dry-run mode RESET and PERSIST are skipped and the store is only read.

use crate::balancer::CategoryBalancer;
use crate::error::SelectionError;
use crate::filter::NewsFilter;
use crate::models::{ScoredCandidate, SelectionReport};
use crate::store::{NewsStore, SelectionMark};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Run parameters.
#[derive(Debug, Clone)]
pub struct SelectionParams {
    pub target_count: usize,
    pub max_local_gov: usize,
    pub freshness_hours: i64,
    pub dry_run: bool,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            target_count: 10,
            max_local_gov: 1,
            freshness_hours: 24,
            dry_run: false,
        }
    }
}

pub struct DailySelector<S> {
    store: S,
    filter: NewsFilter,
    balancer: CategoryBalancer,
    params: SelectionParams,
}

impl<S: NewsStore> DailySelector<S> {
    pub fn new(store: S, filter: NewsFilter, balancer: CategoryBalancer, params: SelectionParams) -> Self {
        Self {
            store,
            filter,
            balancer,
            params,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the daily selection as of now.
    pub async fn run_daily_selection(&self) -> Result<SelectionReport, SelectionError> {
        self.run_daily_selection_at(Utc::now()).await
    }

    /// Run the daily selection as of `now`.
    #[instrument(level = "info", skip_all, fields(now = %now, dry_run = self.params.dry_run))]
    pub async fn run_daily_selection_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SelectionReport, SelectionError> {
        let params = &self.params;

        let reset_count = if params.dry_run {
            0
        } else {
            self.store.reset_queue(now).await?
        };
        info!(reset_count, "Reset previous queue");

        // A window reaching past the representable range admits everything.
        let cutoff = TimeDelta::try_hours(params.freshness_hours)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut candidates = self.store.fetch_eligible_candidates(cutoff).await?;
        // Enforced here as well so a lenient store cannot leak stale rows.
        candidates.retain(|c| c.reference_time().is_some_and(|t| t >= cutoff));
        let eligible_count = candidates.len();
        info!(eligible_count, cutoff = %cutoff, "Fetched eligible candidates");

        let history = self.store.load_historical_titles().await?;
        let outcome = self.filter.filter(candidates, history.as_slice());
        let admitted_count = outcome.admitted.len();

        let selected = self
            .balancer
            .select(&outcome.admitted, params.target_count, params.max_local_gov);
        let category_counts = count_by(&selected, |c| c.category);
        let source_counts = count_by(&selected, |c| c.source().to_string());
        info!(
            admitted_count,
            selected = selected.len(),
            categories = ?category_counts,
            sources = ?source_counts,
            "Selection balanced"
        );

        if selected.is_empty() {
            let reason = if eligible_count == 0 {
                "no eligible candidates"
            } else {
                "all candidates filtered out"
            };
            warn!(reason, "Empty selection");
        }

        let updated_count = if params.dry_run || selected.is_empty() {
            0
        } else {
            let marks: Vec<SelectionMark> = selected.iter().map(SelectionMark::from).collect();
            self.store.mark_selected(&marks, now).await?
        };

        let report = SelectionReport {
            reset_count,
            eligible_count,
            admitted_count,
            selected_count: selected.len(),
            updated_count,
            selected_ids: selected.iter().map(ScoredCandidate::id).collect(),
            category_counts,
            source_counts,
            rejected: outcome.rejected.to_map(),
            timestamp: now,
            dry_run: params.dry_run,
        };
        info!(
            selected_count = report.selected_count,
            updated_count = report.updated_count,
            "Daily selection complete"
        );
        Ok(report)
    }
}

fn count_by<K: Ord>(items: &[ScoredCandidate], key: impl Fn(&ScoredCandidate) -> K) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}
