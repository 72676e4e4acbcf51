//! Admissibility gate and priority scoring.
//!
//! Every candidate runs a short-circuiting gate:
//!
//! 1. empty or blank content
//! 2. excluded genre (opinion, column, advertorial...), any source
//! 3. administrative notice, unless the source is central government
//! 4. no analytical value
//! 5. brief news
//! 6. duplicate of a historical title, then of a title admitted earlier in this pass
//!
//! Survivors are classified, content-scored and given a `priority_score`
//! that blends formal signals (40%) with the content score (60%).
//!
//! The duplicate check is sequential: each admitted title joins the pool
//! the next candidate is compared against, so input order decides which of
//! two near-identical stories survives.

use crate::dedup::DuplicateDetector;
use crate::error::ConfigError;
use crate::models::{Candidate, Category, ScoredCandidate};
use crate::rules::FilterRules;
use crate::scorer::ContentScorer;
use crate::utils::{char_len, contains_any, count_hits, truncate_for_log};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    NoContent,
    ExcludedGenre,
    AdministrativeNotice,
    NoAnalyticalValue,
    BriefNews,
    DuplicateOfHistory,
    DuplicateInBatch,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::NoContent => "no_content",
            RejectReason::ExcludedGenre => "excluded_genre",
            RejectReason::AdministrativeNotice => "administrative_notice",
            RejectReason::NoAnalyticalValue => "no_analytical_value",
            RejectReason::BriefNews => "brief_news",
            RejectReason::DuplicateOfHistory => "duplicate_of_history",
            RejectReason::DuplicateInBatch => "duplicate_in_batch",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-reason rejection counts of one filter pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RejectionTally {
    counts: BTreeMap<RejectReason, usize>,
}

impl RejectionTally {
    pub fn record(&mut self, reason: RejectReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn get(&self, reason: RejectReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn duplicates(&self) -> usize {
        self.get(RejectReason::DuplicateOfHistory) + self.get(RejectReason::DuplicateInBatch)
    }

    /// Counts keyed by the reason's snake_case name, for reports.
    pub fn to_map(&self) -> BTreeMap<String, usize> {
        self.counts
            .iter()
            .map(|(reason, n)| (reason.as_str().to_string(), *n))
            .collect()
    }
}

/// Result of one filter pass.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Admitted candidates in input order.
    pub admitted: Vec<ScoredCandidate>,
    pub rejected: RejectionTally,
}

#[derive(Debug, Clone)]
pub struct NewsFilter {
    rules: Arc<FilterRules>,
    scorer: Arc<ContentScorer>,
    detector: DuplicateDetector,
    data_patterns: Vec<Regex>,
    brief_patterns: Vec<Regex>,
    dedup_enabled: bool,
}

impl NewsFilter {
    /// Compile the configured patterns once.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Regex`] if a data or brief-news pattern is not a valid regex.
    pub fn new(rules: Arc<FilterRules>, scorer: Arc<ContentScorer>) -> Result<Self, ConfigError> {
        let data_patterns = compile_all(&rules.data_patterns)?;
        let brief_patterns = compile_all(&rules.brief_news_patterns)?;
        let detector = DuplicateDetector::new(&rules.dedup);
        Ok(Self {
            rules,
            scorer,
            detector,
            data_patterns,
            brief_patterns,
            dedup_enabled: true,
        })
    }

    /// Enable or disable step 6 of the gate.
    pub fn with_dedup(mut self, enabled: bool) -> Self {
        self.dedup_enabled = enabled;
        self
    }

    /// Run the gate over `candidates` in order, comparing titles against
    /// `history` and against titles admitted earlier in this pass.
    #[instrument(level = "info", skip_all, fields(candidates = candidates.len(), history = history.len()))]
    pub fn filter<S: AsRef<str>>(&self, candidates: Vec<Candidate>, history: &[S]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        let mut batch_titles: Vec<String> = Vec::new();

        for candidate in candidates {
            if let Err(reason) = self.admissible(&candidate) {
                debug!(id = candidate.id, %reason, "Rejected candidate");
                outcome.rejected.record(reason);
                continue;
            }

            if self.dedup_enabled {
                if let Some(reason) = self.duplicate_reason(&candidate, history, &batch_titles) {
                    outcome.rejected.record(reason);
                    continue;
                }
                batch_titles.push(candidate.title.clone());
            }

            outcome.admitted.push(self.score(candidate));
        }

        if outcome.rejected.duplicates() > 0 {
            info!(
                duplicates = outcome.rejected.duplicates(),
                admitted = outcome.admitted.len(),
                "Duplicate removal complete"
            );
        }
        info!(
            admitted = outcome.admitted.len(),
            rejected = outcome.rejected.total(),
            "Filter pass complete"
        );
        outcome
    }

    /// Steps 1 to 5 of the gate.
    pub fn admissible(&self, c: &Candidate) -> Result<(), RejectReason> {
        if c.content.trim().is_empty() {
            return Err(RejectReason::NoContent);
        }
        let combined = format!("{}{}", c.title, c.content);
        let exempt = self.is_central_gov(&c.source);

        if contains_any(&combined, &self.rules.excluded_keywords) {
            return Err(RejectReason::ExcludedGenre);
        }
        if !exempt && contains_any(&combined, &self.rules.government_admin_keywords) {
            return Err(RejectReason::AdministrativeNotice);
        }
        if !self.has_analytical_value(&c.title, &combined, exempt) {
            return Err(RejectReason::NoAnalyticalValue);
        }
        if self.is_brief_news(&c.title, &c.content, &combined) {
            return Err(RejectReason::BriefNews);
        }
        Ok(())
    }

    fn duplicate_reason<S: AsRef<str>>(
        &self,
        c: &Candidate,
        history: &[S],
        batch: &[String],
    ) -> Option<RejectReason> {
        let (reason, m) = if let Some(m) = self.detector.find_duplicate(&c.title, history) {
            (RejectReason::DuplicateOfHistory, m)
        } else if let Some(m) = self.detector.find_duplicate(&c.title, batch) {
            (RejectReason::DuplicateInBatch, m)
        } else {
            return None;
        };

        info!(
            id = c.id,
            title = %truncate_for_log(&c.title, 30),
            matched = %truncate_for_log(&m.matched, 30),
            similarity = %format!("{:.2}", m.similarity),
            %reason,
            "Dropped duplicate"
        );
        Some(reason)
    }

    fn is_central_gov(&self, source: &str) -> bool {
        self.rules.central_gov_sources.iter().any(|s| s == source)
    }

    fn has_analytical_value(&self, title: &str, combined: &str, exempt: bool) -> bool {
        if !exempt && title.contains("印发") && title.contains("办公") {
            return false;
        }
        if self.data_patterns.iter().any(|re| re.is_match(combined)) {
            return true;
        }
        if count_hits(combined, &self.rules.concrete_keywords) >= 2 {
            return true;
        }
        char_len(title) > 15
    }

    fn is_brief_news(&self, title: &str, content: &str, combined: &str) -> bool {
        if self.brief_patterns.iter().any(|re| re.is_match(combined)) {
            return true;
        }
        char_len(title) < 20 && char_len(content) < 100
    }

    /// Derive every post-filter field of an admitted candidate.
    pub fn score(&self, candidate: Candidate) -> ScoredCandidate {
        let combined = format!("{}{}", candidate.title, candidate.content);
        let rules = &self.rules;

        let category = self.categorize(&combined);
        let is_domestic = self.is_domestic(&combined);
        let is_local_gov = rules.local_gov_sources.contains(&candidate.source);
        let fact_richness = self.fact_richness(&combined, &candidate.content);
        let (scope_score, is_broad) = self.scope(&combined);

        let source_weight = rules
            .source_priority
            .get(&candidate.source)
            .copied()
            .unwrap_or(rules.default_source_priority);
        let central_bonus = if rules.central_sources.contains(&candidate.source) {
            5
        } else {
            0
        };
        let domestic_bonus = if is_domestic { 6 } else { 0 };
        let formal_score = f64::from(source_weight + central_bonus + domestic_bonus + fact_richness);
        let formal_normalized = (formal_score / rules.formal_max).clamp(0.0, 1.0) * 100.0;

        let content = self
            .scorer
            .score(&candidate.title, &candidate.content, &candidate.source);
        let priority_score = formal_normalized * 0.40 + content.total_score * 0.60;

        debug!(
            id = candidate.id,
            title = %truncate_for_log(&candidate.title, 30),
            %category,
            formal_score,
            content_score = content.total_score,
            priority_score,
            "Admitted candidate"
        );

        ScoredCandidate {
            candidate,
            category,
            is_domestic,
            is_local_gov,
            fact_richness,
            scope_score,
            is_broad,
            formal_score,
            formal_normalized,
            content,
            priority_score,
        }
    }

    /// Keyword vote over the categories; the first category with the top count wins.
    fn categorize(&self, combined: &str) -> Category {
        let mut best: Option<(Category, usize)> = None;
        for group in &self.rules.categories {
            let votes = count_hits(combined, &group.keywords);
            if best.is_none_or(|(_, top)| votes > top) {
                best = Some((group.category, votes));
            }
        }
        best.map_or(Category::Policy, |(category, _)| category)
    }

    fn is_domestic(&self, combined: &str) -> bool {
        let foreign = count_hits(combined, &self.rules.foreign_keywords);
        let domestic = count_hits(combined, &self.rules.domestic_keywords);
        domestic > foreign || foreign <= 1
    }

    fn fact_richness(&self, combined: &str, content: &str) -> i32 {
        let data_hits = self.data_patterns.iter().filter(|re| re.is_match(combined)).count() as i32;
        let fact_hits = count_hits(combined, &self.rules.fact_rich_keywords) as i32;

        let mut score = (data_hits * 3).min(12) + (fact_hits * 2).min(8);

        let len = char_len(content);
        if len > 500 {
            score += 3;
        } else if len > 250 {
            score += 1;
        } else if len < 100 {
            score -= 5;
        }
        if len < 50 {
            score -= 10;
        }
        score
    }

    /// `(scope_score, is_broad)`; broad stories sort ahead of deep analysis.
    fn scope(&self, combined: &str) -> (i32, bool) {
        let broad = count_hits(combined, &self.rules.broad_scope_keywords) as i32;
        let deep = count_hits(combined, &self.rules.deep_analysis_keywords) as i32;
        match broad.cmp(&deep) {
            std::cmp::Ordering::Greater => (10 + broad, true),
            std::cmp::Ordering::Less => (5 - deep, false),
            std::cmp::Ordering::Equal => (7, true),
        }
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|source| ConfigError::Regex {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

/// Filter `candidates` with the built-in tables and an empty history.
///
/// # Errors
///
/// Only if the built-in patterns fail to compile.
pub fn filter_news(candidates: Vec<Candidate>) -> Result<Vec<ScoredCandidate>, ConfigError> {
    let filter = NewsFilter::new(
        Arc::new(FilterRules::default()),
        Arc::new(ContentScorer::default()),
    )?;
    let history: [&str; 0] = [];
    Ok(filter.filter(candidates, &history).admitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const BODY: &str = "数据显示，今年前三季度全国集成电路产量同比增长25%，产业规模持续扩大，多地加快布局先进制程与封装测试产能。\
                        数据显示，今年前三季度全国集成电路产量同比增长25%，产业规模持续扩大，多地加快布局先进制程与封装测试产能。";

    fn candidate(id: i64, title: &str, content: &str, source: &str) -> Candidate {
        Candidate {
            id,
            title: title.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap()),
            collected_at: None,
            importance_score: None,
            translated_title: Some("translated".to_string()),
        }
    }

    fn news_filter() -> NewsFilter {
        NewsFilter::new(
            Arc::new(FilterRules::default()),
            Arc::new(ContentScorer::default()),
        )
        .unwrap()
    }

    fn reject(f: &NewsFilter, c: Candidate) -> Option<RejectReason> {
        let outcome = f.filter(vec![c], &[] as &[&str]);
        assert!(outcome.rejected.total() <= 1);
        outcome
            .rejected
            .counts
            .keys()
            .next()
            .copied()
    }

    #[test]
    fn test_empty_content_is_rejected_regardless_of_title() {
        let f = news_filter();
        let title = "国务院常务会议部署集成电路产业发展，全国投资规模突破1万亿元";
        assert_eq!(reject(&f, candidate(1, title, "", "gov_cn")), Some(RejectReason::NoContent));
        assert_eq!(reject(&f, candidate(2, title, "  \n\t ", "gov_cn")), Some(RejectReason::NoContent));
    }

    #[test]
    fn test_excluded_genre_applies_to_every_source() {
        let f = news_filter();
        let c = candidate(1, "评论：集成电路产业迎来新机遇与新挑战并存", BODY, "gov_cn");
        assert_eq!(reject(&f, c), Some(RejectReason::ExcludedGenre));
    }

    #[test]
    fn test_administrative_notice_exempt_for_central_government() {
        let f = news_filter();
        let title = "关于印发2025年集成电路产业发展工作方案的通知";

        let local = candidate(1, title, BODY, "beijing_gov");
        assert_eq!(reject(&f, local), Some(RejectReason::AdministrativeNotice));

        let central = candidate(2, title, BODY, "gov_cn");
        assert_eq!(reject(&f, central), None);
    }

    #[test]
    fn test_office_circular_lacks_analytical_value() {
        let f = news_filter();
        let c = candidate(1, "省政府办公厅印发推进集成电路产业发展意见", BODY, "beijing_gov");
        assert_eq!(reject(&f, c), Some(RejectReason::NoAnalyticalValue));

        let c = candidate(2, "省政府办公厅印发推进集成电路产业发展意见", BODY, "ndrc");
        assert_eq!(reject(&f, c), None);
    }

    #[test]
    fn test_no_data_short_title_lacks_analytical_value() {
        let f = news_filter();
        let body = "车企纷纷调整策略，渠道库存压力仍然较大。".repeat(8);
        let c = candidate(1, "新能源车市走势", &body, "36kr");
        assert_eq!(reject(&f, c), Some(RejectReason::NoAnalyticalValue));
    }

    #[test]
    fn test_brief_news() {
        let f = news_filter();
        let c = candidate(1, "宁德时代股价上涨", "盘中上涨5%。", "cls");
        assert_eq!(reject(&f, c), Some(RejectReason::BriefNews));

        let c = candidate(2, "丰田汽车计划扩大在华电动车生产规模并新建研发中心", BODY, "cls");
        assert_eq!(reject(&f, c), Some(RejectReason::BriefNews));
    }

    #[test]
    fn test_batch_duplicates_first_seen_wins() {
        let f = news_filter();
        let a = candidate(1, "央行下调存款利率0.25%", BODY, "people");
        let b = candidate(2, "央行下调利率25个基点", BODY, "caixin");

        let outcome = f.filter(vec![a.clone(), b.clone()], &[] as &[&str]);
        assert_eq!(outcome.admitted.len(), 1);
        assert_eq!(outcome.admitted[0].id(), 1);
        assert_eq!(outcome.rejected.get(RejectReason::DuplicateInBatch), 1);

        let outcome = f.filter(vec![b, a], &[] as &[&str]);
        assert_eq!(outcome.admitted.len(), 1);
        assert_eq!(outcome.admitted[0].id(), 2);
    }

    #[test]
    fn test_history_duplicates_are_checked_first() {
        let f = news_filter();
        let a = candidate(1, "央行下调存款利率0.25%", BODY, "people");
        let outcome = f.filter(vec![a], &["央行下调利率25个基点"]);
        assert!(outcome.admitted.is_empty());
        assert_eq!(outcome.rejected.get(RejectReason::DuplicateOfHistory), 1);
        assert_eq!(outcome.rejected.to_map()["duplicate_of_history"], 1);
    }

    #[test]
    fn test_dedup_can_be_disabled() {
        let f = news_filter().with_dedup(false);
        let a = candidate(1, "央行下调存款利率0.25%", BODY, "people");
        let b = candidate(2, "央行下调利率25个基点", BODY, "caixin");
        let outcome = f.filter(vec![a, b], &["央行下调存款利率0.25%"]);
        assert_eq!(outcome.admitted.len(), 2);
        assert_eq!(outcome.rejected.total(), 0);
    }

    #[test]
    fn test_priority_blends_formal_and_content() {
        let f = news_filter();
        let outcome = f.filter(
            vec![candidate(1, "央行下调存款利率0.25%", BODY, "people")],
            &[] as &[&str],
        );
        let s = &outcome.admitted[0];

        // people: weight 11, central +5, domestic +6.
        assert!(s.is_domestic);
        assert!(!s.is_local_gov);
        assert_eq!(s.formal_score, f64::from(11 + 5 + 6 + s.fact_richness));
        let expected_norm = (s.formal_score / 40.0).min(1.0) * 100.0;
        assert!((s.formal_normalized - expected_norm).abs() < 1e-9);
        let expected = s.formal_normalized * 0.4 + s.content_score() * 0.6;
        assert!((s.priority_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_negative_formal_score_normalizes_to_zero() {
        let f = news_filter();
        let c = candidate(
            1,
            "美国欧洲日本三地央行同时宣布维持利率不变市场反应平淡",
            "三地央行维持利率不变。",
            "reuters_cn",
        );
        let outcome = f.filter(vec![c], &[] as &[&str]);
        let s = &outcome.admitted[0];
        assert!(!s.is_domestic);
        assert_eq!(s.fact_richness, -13);
        assert_eq!(s.formal_score, -8.0);
        assert_eq!(s.formal_normalized, 0.0);
        assert!((s.priority_score - s.content_score() * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_local_gov_flag() {
        let f = news_filter();
        let c = candidate(1, "深圳出台集成电路产业扶持新政，全市新增投资规模超过百亿", BODY, "shenzhen_gov");
        let outcome = f.filter(vec![c], &[] as &[&str]);
        assert!(outcome.admitted[0].is_local_gov);
    }

    #[test]
    fn test_category_vote_and_tie_break() {
        let f = news_filter();
        assert_eq!(f.categorize(""), Category::Policy);
        // One vote each for policy and tech: declared order decides.
        assert_eq!(f.categorize("政策与技术"), Category::Policy);
        assert_eq!(f.categorize("科技与技术政策"), Category::Tech);
    }

    #[test]
    fn test_scope_three_way() {
        let f = news_filter();
        assert_eq!(f.scope("全国市场分析"), (12, true));
        assert_eq!(f.scope("深度解读"), (3, false));
        assert_eq!(f.scope(""), (7, true));
    }

    #[test]
    fn test_fact_richness_short_content_penalty() {
        let f = news_filter();
        assert_eq!(f.fact_richness("短", "短"), -15);
    }

    #[test]
    fn test_domestic_rule() {
        let f = news_filter();
        assert!(f.is_domestic("美国对中国出口"));
        assert!(!f.is_domestic("美国欧洲日本"));
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let rules = FilterRules {
            brief_news_patterns: vec!["(".to_string()],
            ..FilterRules::default()
        };
        let err = NewsFilter::new(Arc::new(rules), Arc::new(ContentScorer::default())).unwrap_err();
        assert!(matches!(err, ConfigError::Regex { ref pattern, .. } if pattern == "("));
    }

    #[test]
    fn test_filter_news_uses_builtin_tables() {
        let admitted = filter_news(vec![
            candidate(1, "央行下调存款利率0.25%", BODY, "people"),
            candidate(2, "空内容", "", "people"),
        ])
        .unwrap();
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].id(), 1);
    }
}
