//! Two-phase greedy category balancer.
//!
//! Phase 1 makes one pass over the fixed category order and takes the best
//! remaining item of each category, subject to the per-source caps (explicit
//! overrides, otherwise 2) and the local-government cap. Phase 2 merges
//! whatever is left, re-sorts it by `(priority_score, published_at)` and
//! fills the remaining slots under a relaxed source cap of 3.
//!
//! Caps are enforced at pick time, never repaired afterwards, so the result
//! can be shorter than the target even when candidates remain.

use crate::models::{Category, ScoredCandidate};
use crate::rules::BalanceRules;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default)]
pub struct CategoryBalancer {
    rules: BalanceRules,
}

/// Running per-source and local-government counts of the selection.
#[derive(Default)]
struct Quota<'a> {
    by_source: HashMap<&'a str, usize>,
    local_gov: usize,
}

impl<'a> Quota<'a> {
    fn admits(
        &self,
        item: &ScoredCandidate,
        rules: &BalanceRules,
        phase_cap: usize,
        max_local_gov: usize,
    ) -> bool {
        let used = self.by_source.get(item.source()).copied().unwrap_or(0);
        if rules
            .source_max_count
            .get(item.source())
            .is_some_and(|cap| used >= *cap)
        {
            return false;
        }
        if item.is_local_gov && self.local_gov >= max_local_gov {
            return false;
        }
        used < phase_cap
    }

    fn take(&mut self, item: &'a ScoredCandidate) {
        *self.by_source.entry(item.source()).or_insert(0) += 1;
        if item.is_local_gov {
            self.local_gov += 1;
        }
    }
}

/// Descending by `(priority_score, published_at)`; a missing timestamp sorts last.
fn by_priority_then_recency(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| b.candidate.published_at.cmp(&a.candidate.published_at))
}

/// Central before local, broad before deep, then priority; all descending.
fn final_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    a.is_local_gov
        .cmp(&b.is_local_gov)
        .then_with(|| b.scope_score.cmp(&a.scope_score))
        .then_with(|| b.priority_score.total_cmp(&a.priority_score))
}

impl CategoryBalancer {
    pub fn new(rules: BalanceRules) -> Self {
        Self { rules }
    }

    /// Select at most `target_count` items from `pool`.
    ///
    /// The input is not modified; the selection is returned in final order.
    #[instrument(level = "info", skip_all, fields(pool = pool.len(), target = target_count, max_local_gov = max_local_gov))]
    pub fn select(
        &self,
        pool: &[ScoredCandidate],
        target_count: usize,
        max_local_gov: usize,
    ) -> Vec<ScoredCandidate> {
        // Worklist of pool indices per category, best first.
        let mut worklists: BTreeMap<Category, Vec<usize>> = BTreeMap::new();
        for (idx, item) in pool.iter().enumerate() {
            worklists.entry(item.category).or_default().push(idx);
        }
        for list in worklists.values_mut() {
            list.sort_by(|&a, &b| by_priority_then_recency(&pool[a], &pool[b]));
        }

        let mut selected: Vec<usize> = Vec::with_capacity(target_count);
        let mut quota = Quota::default();

        // Phase 1: at most one pick per category, in the configured order.
        for category in &self.rules.category_order {
            if selected.len() >= target_count {
                break;
            }
            let Some(list) = worklists.get_mut(category) else {
                continue;
            };
            let pick = list.iter().position(|&idx| {
                quota.admits(&pool[idx], &self.rules, self.rules.phase_one_source_cap, max_local_gov)
            });
            if let Some(pos) = pick {
                let idx = list.remove(pos);
                quota.take(&pool[idx]);
                selected.push(idx);
                debug!(id = pool[idx].id(), %category, source = pool[idx].source(), "Phase 1 pick");
            }
        }
        let phase_one = selected.len();

        // Phase 2: everything left, merged in pool order and re-sorted.
        if selected.len() < target_count {
            let mut remaining: Vec<usize> = worklists.into_values().flatten().collect();
            remaining.sort_unstable();
            remaining.sort_by(|&a, &b| by_priority_then_recency(&pool[a], &pool[b]));

            for idx in remaining {
                if selected.len() >= target_count {
                    break;
                }
                if quota.admits(&pool[idx], &self.rules, self.rules.phase_two_source_cap, max_local_gov) {
                    quota.take(&pool[idx]);
                    selected.push(idx);
                }
            }
        }

        let mut result: Vec<ScoredCandidate> = selected.into_iter().map(|idx| pool[idx].clone()).collect();
        result.sort_by(final_order);
        result.truncate(target_count);

        info!(
            phase_one,
            phase_two = result.len().saturating_sub(phase_one),
            selected = result.len(),
            local_gov = quota.local_gov,
            "Balanced selection"
        );
        result
    }
}

/// Balance `filtered` with the default category order and source caps.
pub fn balance_categories(
    filtered: &[ScoredCandidate],
    target_count: usize,
    max_local_gov: usize,
) -> Vec<ScoredCandidate> {
    CategoryBalancer::default().select(filtered, target_count, max_local_gov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, ContentScoreResult};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;

    fn item(id: i64, category: Category, source: &str, priority: f64) -> ScoredCandidate {
        let base = Utc.with_ymd_and_hms(2025, 5, 6, 0, 0, 0).unwrap();
        ScoredCandidate {
            candidate: Candidate {
                id,
                title: format!("title {id}"),
                content: "content".to_string(),
                source: source.to_string(),
                published_at: Some(base + Duration::minutes(id)),
                collected_at: None,
                importance_score: None,
                translated_title: None,
            },
            category,
            is_domestic: true,
            is_local_gov: false,
            fact_richness: 0,
            scope_score: 7,
            is_broad: true,
            formal_score: 0.0,
            formal_normalized: 0.0,
            content: ContentScoreResult {
                total_score: 0.0,
                weighted_raw: 0.0,
                multiplier: 1.0,
                breakdown: BTreeMap::new(),
                boosters: Vec::new(),
                explanation: String::new(),
            },
            priority_score: priority,
        }
    }

    fn local(mut c: ScoredCandidate) -> ScoredCandidate {
        c.is_local_gov = true;
        c
    }

    fn count_source(selection: &[ScoredCandidate], source: &str) -> usize {
        selection.iter().filter(|c| c.source() == source).count()
    }

    /// 15 candidates over 7 categories; "people" owns the top five scores.
    fn fifteen() -> Vec<ScoredCandidate> {
        use Category::*;
        vec![
            item(1, Tech, "people", 99.0),
            item(2, Industry, "people", 98.0),
            item(3, Energy, "people", 97.0),
            item(4, Corporate, "people", 96.0),
            item(5, Finance, "people", 95.0),
            item(6, Tech, "36kr", 60.0),
            item(7, Industry, "huxiu", 59.0),
            item(8, Energy, "cls", 58.0),
            item(9, Corporate, "yicai", 57.0),
            item(10, Finance, "caixin", 56.0),
            item(11, Policy, "ce", 55.0),
            item(12, Macro, "stcn", 54.0),
            item(13, Policy, "jiemian", 53.0),
            item(14, Macro, "cnstock", 52.0),
            item(15, Tech, "21jingji", 51.0),
        ]
    }

    #[test]
    fn test_source_cap_with_dominant_source() {
        let rules = BalanceRules {
            source_max_count: BTreeMap::from([("people".to_string(), 2)]),
            ..BalanceRules::default()
        };
        let selection = CategoryBalancer::new(rules).select(&fifteen(), 10, 1);
        assert_eq!(selection.len(), 10);
        assert_eq!(count_source(&selection, "people"), 2);
    }

    #[test]
    fn test_default_caps_limit_dominant_source_in_phase_one() {
        let selection = balance_categories(&fifteen(), 7, 1);
        assert_eq!(selection.len(), 7);
        // Phase 1 alone fills 7 slots, one per category; "people" stops at 2.
        assert_eq!(count_source(&selection, "people"), 2);
        let categories: HashSet<Category> = selection.iter().map(|c| c.category).collect();
        assert_eq!(categories.len(), 7);
    }

    #[test]
    fn test_phase_two_relaxes_cap_to_three() {
        let selection = balance_categories(&fifteen(), 15, 1);
        assert_eq!(count_source(&selection, "people"), 3);
        // 7 from phase 1, then one more "people" item and the five others.
        assert_eq!(selection.len(), 13);
    }

    #[test]
    fn test_phase_one_takes_one_per_category_in_order() {
        use Category::*;
        let pool = vec![
            item(1, Macro, "a", 90.0),
            item(2, Tech, "b", 10.0),
            item(3, Tech, "c", 80.0),
            item(4, Policy, "d", 70.0),
        ];
        // Target 2 is reached after tech and policy; macro is never visited.
        let selection = balance_categories(&pool, 2, 1);
        let ids: HashSet<i64> = selection.iter().map(|c| c.id()).collect();
        assert_eq!(ids, HashSet::from([3, 4]));
    }

    #[test]
    fn test_local_gov_cap_is_hard() {
        use Category::*;
        let pool = vec![
            local(item(1, Tech, "beijing_gov", 99.0)),
            local(item(2, Industry, "shanghai_gov", 98.0)),
            local(item(3, Energy, "sznews", 97.0)),
            item(4, Finance, "people", 10.0),
        ];
        let selection = balance_categories(&pool, 4, 1);
        assert_eq!(selection.iter().filter(|c| c.is_local_gov).count(), 1);
        assert_eq!(selection.len(), 2);

        let none = balance_categories(&pool, 4, 0);
        assert_eq!(none.len(), 1);
        assert_eq!(none[0].id(), 4);
    }

    #[test]
    fn test_explicit_source_cap_applies_in_both_phases() {
        use Category::*;
        let pool = vec![
            item(1, Tech, "shenzhen_gov", 90.0),
            item(2, Industry, "shenzhen_gov", 80.0),
            item(3, Energy, "shenzhen_gov", 70.0),
        ];
        let selection = balance_categories(&pool, 3, 5);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].id(), 1);
    }

    #[test]
    fn test_never_pads_short_pools() {
        let pool = vec![item(1, Category::Tech, "a", 50.0)];
        assert_eq!(balance_categories(&pool, 10, 1).len(), 1);
        assert!(balance_categories(&[], 10, 1).is_empty());
        assert!(balance_categories(&pool, 0, 1).is_empty());
    }

    #[test]
    fn test_final_ordering() {
        use Category::*;
        let mut broad_low = item(1, Tech, "a", 10.0);
        broad_low.scope_score = 13;
        let mut deep_high = item(2, Industry, "b", 90.0);
        deep_high.scope_score = 3;
        deep_high.is_broad = false;
        let central_mid = item(3, Energy, "c", 50.0);
        let local_top = local(item(4, Corporate, "beijing_gov", 99.0));

        let selection = balance_categories(&[deep_high, local_top, central_mid, broad_low], 4, 1);
        let ids: Vec<i64> = selection.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_ties_prefer_recent_publication() {
        use Category::*;
        let pool = vec![item(1, Tech, "a", 50.0), item(2, Tech, "b", 50.0)];
        let selection = balance_categories(&pool, 1, 1);
        assert_eq!(selection[0].id(), 2);
    }

    #[test]
    fn test_input_is_untouched() {
        let pool = fifteen();
        let before = pool.clone();
        let _ = balance_categories(&pool, 5, 1);
        assert_eq!(pool, before);
    }
}
