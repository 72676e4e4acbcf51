//! Content-based scoring of Chinese economic news.
//!
//! Eight independent axis scorers read the title and body and each return
//! a 0..=100 score with the tier that produced it and the evidence found:
//!
//! | Axis | Weight | Best-match policy |
//! |------|--------|-------------------|
//! | policy hierarchy | 0.25 | highest tier hit |
//! | corporate hierarchy | 0.15 | central SOE (strategic) > central SOE > large private > foreign > local SOE > generic |
//! | strategic industry | 0.20 | food security fixed at 80, else highest tier hit |
//! | economic scale | 0.15 | largest 万亿/千亿/亿 amount mapped through thresholds, plus scope bonus |
//! | geographic significance | 0.10 | highest tier hit |
//! | time sensitivity | 0.05 | highest tier hit |
//! | international impact | 0.05 | highest tier hit |
//! | social impact | 0.05 | highest tier hit |
//!
//! The weighted composite is multiplied by the product of every applicable
//! booster. The product is capped (1.3 by default) before it is applied and
//! the result is clamped to 100.
//!
//! The scorer is a pure function of its input and its rule tables: no I/O,
//! no per-call state, and no input can make it fail.

use crate::models::{AppliedBooster, Axis, AxisScore, ContentScoreResult};
use crate::rules::{ScoringRules, Tier};
use crate::utils::{contains_any, round_to};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static TRILLION_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*万亿").expect("static regex"));
static HUNDRED_MILLION_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*亿").expect("static regex"));

const TRILLION: f64 = 1e12;
const HUNDRED_BILLION: f64 = 1e11;
const HUNDRED_MILLION: f64 = 1e8;

/// Policy evidence stops at the national-legislature tier.
const POLICY_CEILING: u32 = 100;

/// Stateless eight-axis scorer. Construct once and share by reference.
#[derive(Debug, Clone)]
pub struct ContentScorer {
    rules: ScoringRules,
}

impl Default for ContentScorer {
    fn default() -> Self {
        Self::new(ScoringRules::default())
    }
}

impl ContentScorer {
    /// Build a scorer over `rules`.
    ///
    /// Tier tables are re-ordered highest score first and amount thresholds
    /// largest first. The sorts are stable, so entries sharing a key keep
    /// their declared order.
    pub fn new(mut rules: ScoringRules) -> Self {
        for table in [
            &mut rules.policy_hierarchy,
            &mut rules.strategic_industries,
            &mut rules.geographic,
            &mut rules.time_sensitivity,
            &mut rules.international_impact,
            &mut rules.social_impact,
        ] {
            table.sort_by(|a, b| b.score.cmp(&a.score));
        }
        rules
            .economic_thresholds
            .sort_by(|a, b| b.min_yuan.total_cmp(&a.min_yuan));
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Score one article.
    ///
    /// `source` is the feed key. It is carried for callers but does not
    /// contribute evidence: only the title and body are scored.
    pub fn score(&self, title: &str, content: &str, _source: &str) -> ContentScoreResult {
        let text = format!("{title}{content}");

        let (corporate, central_soe) = self.score_corporate_hierarchy(&text);
        let mut breakdown = BTreeMap::new();
        breakdown.insert(
            Axis::PolicyHierarchy,
            best_tier(&self.rules.policy_hierarchy, &text, 5, Some(POLICY_CEILING)),
        );
        breakdown.insert(Axis::CorporateHierarchy, corporate);
        breakdown.insert(Axis::StrategicIndustry, self.score_strategic_industry(&text));
        breakdown.insert(Axis::EconomicScale, self.score_economic_scale(&text));
        breakdown.insert(
            Axis::GeographicSignificance,
            best_tier(&self.rules.geographic, &text, 5, None),
        );
        breakdown.insert(
            Axis::TimeSensitivity,
            best_tier(&self.rules.time_sensitivity, &text, 3, None),
        );
        breakdown.insert(
            Axis::InternationalImpact,
            best_tier(&self.rules.international_impact, &text, 3, None),
        );
        breakdown.insert(
            Axis::SocialImpact,
            best_tier(&self.rules.social_impact, &text, 3, None),
        );

        let weighted: f64 = breakdown
            .iter()
            .map(|(axis, s)| f64::from(s.score) * self.rules.weights.weight(*axis))
            .sum();

        let boosters = self.boosters(&text, &breakdown, central_soe);
        let multiplier = boosters
            .iter()
            .map(|b| b.multiplier)
            .product::<f64>()
            .min(self.rules.booster_cap);

        let total = (weighted * multiplier).clamp(0.0, 100.0);
        let explanation = self.explain(&breakdown, &boosters, total);

        ContentScoreResult {
            total_score: round_to(total, 2),
            weighted_raw: round_to(weighted, 2),
            multiplier,
            breakdown,
            boosters,
            explanation,
        }
    }

    /// Returns the axis score and whether a central SOE was identified.
    fn score_corporate_hierarchy(&self, text: &str) -> (AxisScore, bool) {
        let kws = &self.rules.corporate_keywords;
        let mut score = 0;
        let mut label = String::new();
        let mut evidence = Vec::new();

        for name in self.rules.central_soes.iter().chain(&kws.central_soe) {
            if text.contains(name.as_str()) {
                evidence.push(name.clone());
            }
        }
        let central_soe = !evidence.is_empty();

        if central_soe {
            if contains_any(text, &self.rules.strategic_soe_keywords) {
                score = 100;
                label = "中央企业(战略产业)".to_string();
            } else {
                score = 85;
                label = "中央企业(一般产业)".to_string();
            }
        }

        if score < 80 {
            for name in &self.rules.major_private_corps {
                if text.contains(name.as_str()) {
                    score = 80;
                    label = "大型民营企业".to_string();
                    evidence.push(name.clone());
                }
            }
            for (group, group_label) in [(&kws.listed, "上市公司"), (&kws.unicorn, "独角兽企业")] {
                for kw in group {
                    if text.contains(kw.as_str()) {
                        score = 80;
                        if label.is_empty() {
                            label = group_label.to_string();
                        }
                        evidence.push(kw.clone());
                    }
                }
            }
        }

        for (group, group_label) in [(&kws.foreign, "外资企业"), (&kws.local_soe, "地方国有企业")] {
            if score < 60 {
                for kw in group {
                    if text.contains(kw.as_str()) {
                        score = 60;
                        label = group_label.to_string();
                        evidence.push(kw.clone());
                    }
                }
            }
        }

        if score == 0 && contains_any(text, &kws.generic) {
            score = 40;
            label = "中小企业".to_string();
        }

        let axis = AxisScore {
            score,
            label,
            evidence: evidence.into_iter().unique().take(5).collect(),
        };
        (axis, central_soe)
    }

    fn score_strategic_industry(&self, text: &str) -> AxisScore {
        let food = &self.rules.food_security;
        let mut best = AxisScore::default();
        let mut evidence = Vec::new();

        for kw in &food.keywords {
            if text.contains(kw.as_str()) {
                best.score = best.score.max(food.score);
                best.label = food.name.clone();
                evidence.push(kw.clone());
            }
        }

        for tier in &self.rules.strategic_industries {
            for kw in &tier.keywords {
                if text.contains(kw.as_str()) {
                    if tier.score > best.score {
                        best.score = tier.score;
                        best.label = tier.name.clone();
                    }
                    evidence.push(kw.clone());
                }
            }
        }

        best.evidence = evidence.into_iter().unique().take(5).collect();
        best
    }

    fn score_economic_scale(&self, text: &str) -> AxisScore {
        let mut max_amount = 0.0_f64;
        let mut amount_text = String::new();

        for caps in TRILLION_AMOUNT.captures_iter(text) {
            // Digits outside ASCII match \d but do not parse; they contribute nothing.
            let Ok(n) = caps[1].parse::<f64>() else {
                continue;
            };
            if n * TRILLION > max_amount {
                max_amount = n * TRILLION;
                amount_text = caps[0].to_string();
            }
        }

        if max_amount == 0.0 && text.contains("千亿") {
            max_amount = HUNDRED_BILLION;
            amount_text = "千亿".to_string();
        }

        if max_amount < HUNDRED_MILLION {
            for caps in HUNDRED_MILLION_AMOUNT.captures_iter(text) {
                let Ok(n) = caps[1].parse::<f64>() else {
                    continue;
                };
                if n * HUNDRED_MILLION > max_amount {
                    max_amount = n * HUNDRED_MILLION;
                    amount_text = caps[0].to_string();
                }
            }
        }

        let amount_score = self
            .rules
            .economic_thresholds
            .iter()
            .find(|t| max_amount >= t.min_yuan)
            .map_or(0, |t| t.score);

        let mut scope_bonus = 0;
        let mut scope_matched = Vec::new();
        for scope in &self.rules.impact_scope {
            for kw in &scope.keywords {
                if text.contains(kw.as_str()) {
                    scope_bonus = scope_bonus.max(scope.bonus);
                    scope_matched.push(kw.clone());
                }
            }
        }

        AxisScore {
            score: (amount_score + scope_bonus).min(100),
            label: amount_text,
            evidence: scope_matched.into_iter().take(3).collect(),
        }
    }

    fn boosters(
        &self,
        text: &str,
        breakdown: &BTreeMap<Axis, AxisScore>,
        central_soe: bool,
    ) -> Vec<AppliedBooster> {
        let mut applied = Vec::new();

        for booster in &self.rules.boosters {
            // Each booster fires at most once, on its first matching keyword.
            if let Some(kw) = booster.keywords.iter().find(|kw| text.contains(kw.as_str())) {
                applied.push(AppliedBooster {
                    name: booster.name.clone(),
                    multiplier: booster.multiplier,
                    matched: kw.clone(),
                });
            }
        }

        let industry = &breakdown[&Axis::StrategicIndustry];
        if central_soe && industry.score >= self.rules.soe_strategic_min_industry {
            let corporate = &breakdown[&Axis::CorporateHierarchy];
            applied.push(AppliedBooster {
                name: "soe_strategic".to_string(),
                multiplier: self.rules.soe_strategic_multiplier,
                matched: format!("{} + {}", corporate.label, industry.label),
            });
        }

        applied
    }

    /// Render the non-zero axis contributions and boosters, e.g.
    /// `policy/国务院(23.8) + industry/核心战略产业(20.0) [boosters: state_council(x1.3)] = total 57.4`.
    fn explain(
        &self,
        breakdown: &BTreeMap<Axis, AxisScore>,
        boosters: &[AppliedBooster],
        total: f64,
    ) -> String {
        let parts: Vec<String> = breakdown
            .iter()
            .filter(|(_, s)| s.score > 0)
            .map(|(axis, s)| {
                let weighted = f64::from(s.score) * self.rules.weights.weight(*axis);
                let extra = if s.label.is_empty() {
                    String::new()
                } else {
                    format!("/{}", s.label)
                };
                format!("{}{}({:.1})", axis.label(), extra, weighted)
            })
            .collect();

        let base = if parts.is_empty() {
            "no matching signals".to_string()
        } else {
            parts.join(" + ")
        };

        let booster_text = if boosters.is_empty() {
            String::new()
        } else {
            let names = boosters
                .iter()
                .map(|b| format!("{}(x{})", b.name, b.multiplier))
                .join(", ");
            format!(" [boosters: {names}]")
        };

        format!("{base}{booster_text} = total {total:.1}")
    }
}

/// Highest tier with any keyword in `text`.
///
/// Evidence is collected across tiers, highest first. Once the best score
/// reaches `stop_at`, lower tiers are not visited.
fn best_tier(tiers: &[Tier], text: &str, max_evidence: usize, stop_at: Option<u32>) -> AxisScore {
    let mut best = AxisScore::default();
    let mut evidence = Vec::new();

    for tier in tiers {
        for kw in &tier.keywords {
            if text.contains(kw.as_str()) {
                if tier.score > best.score {
                    best.score = tier.score;
                    best.label = tier.name.clone();
                }
                evidence.push(kw.clone());
            }
        }
        if stop_at.is_some_and(|ceiling| best.score >= ceiling) {
            break;
        }
    }

    best.evidence = evidence.into_iter().unique().take(max_evidence).collect();
    best
}

/// Score one article with the built-in tables.
///
/// Convenience for dashboards and one-off checks; long-running callers
/// should build a [`ContentScorer`] once and reuse it.
pub fn score_news(title: &str, content: &str, source: &str) -> ContentScoreResult {
    ContentScorer::default().score(title, content, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEMICONDUCTOR_TITLE: &str = "우리나라 반도체 수출 급증";
    const SEMICONDUCTOR_BODY: &str =
        "国务院常务会议部署半导体产业发展，北京将新增1000亿元投资，全国出口保持增长。";

    #[test]
    fn test_state_council_semiconductor_scenario() {
        let result = score_news(SEMICONDUCTOR_TITLE, SEMICONDUCTOR_BODY, "gov_cn");

        assert!(result.axis(Axis::PolicyHierarchy) >= 95);
        assert_eq!(result.breakdown[&Axis::PolicyHierarchy].label, "国务院");

        let scale = &result.breakdown[&Axis::EconomicScale];
        assert_eq!(scale.label, "1000亿");
        assert!(scale.score >= 80);

        assert_eq!(result.axis(Axis::StrategicIndustry), 100);
        assert!(result.total_score > 60.0);
        assert!(result.boosters.iter().any(|b| b.name == "state_council"));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = ContentScorer::default();
        let a = scorer.score(SEMICONDUCTOR_TITLE, SEMICONDUCTOR_BODY, "gov_cn");
        let b = scorer.score(SEMICONDUCTOR_TITLE, SEMICONDUCTOR_BODY, "gov_cn");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let result = score_news("", "", "");
        assert_eq!(result.total_score, 0.0);
        assert!(result.breakdown.values().all(|s| s.score == 0));
        assert!(result.boosters.is_empty());
        assert_eq!(result.explanation, "no matching signals = total 0.0");
    }

    #[test]
    fn test_booster_product_is_capped() {
        let body = "习近平总书记主持中央政治局会议，国务院常务会议部署中国石化芯片与半导体项目，\
                    央企投资5万亿元，北京上海全国推进，就业与中美供应链突发消息。";
        let result = score_news("重磅", body, "people");

        let raw_product: f64 = result.boosters.iter().map(|b| b.multiplier).product();
        assert!(raw_product > 1.3);
        assert_eq!(result.multiplier, 1.3);
        assert!(result.total_score <= 100.0);
        assert!(result.total_score >= 0.0);
        assert!(result.boosters.iter().any(|b| b.name == "soe_strategic"));
    }

    #[test]
    fn test_total_is_bounded_for_assorted_inputs() {
        let scorer = ContentScorer::default();
        let samples = [
            ("", "1万亿"),
            ("全国人大", "国务院 央企 芯片 9999万亿 北京 突发 中美 就业 习近平"),
            ("abc", "😀😀😀"),
            ("千亿", "千亿千亿"),
        ];
        for (title, body) in samples {
            let r = scorer.score(title, body, "x");
            assert!((0.0..=100.0).contains(&r.total_score), "{title}: {}", r.total_score);
            assert!(r.multiplier <= 1.3);
        }
    }

    #[test]
    fn test_policy_highest_tier_wins() {
        let result = score_news("市政府与人大常委会", "", "");
        let policy = &result.breakdown[&Axis::PolicyHierarchy];
        assert_eq!(policy.score, 100);
        assert_eq!(policy.label, "全国人大");
        // Lower tiers are not searched once the top tier matched.
        assert_eq!(policy.evidence, vec!["人大常委会"]);

        let r = score_news("国务院与市政府", "", "");
        let policy = &r.breakdown[&Axis::PolicyHierarchy];
        assert_eq!(policy.score, 95);
        assert_eq!(policy.evidence, vec!["国务院", "市政府"]);
    }

    #[test]
    fn test_corporate_ladder() {
        let scorer = ContentScorer::default();

        let r = scorer.score("国家电网加快电网建设", "", "");
        assert_eq!(r.axis(Axis::CorporateHierarchy), 100);

        let r = scorer.score("中国建筑中标新项目", "", "");
        assert_eq!(r.axis(Axis::CorporateHierarchy), 85);

        let r = scorer.score("比亚迪发布新车", "", "");
        assert_eq!(r.axis(Axis::CorporateHierarchy), 80);

        let r = scorer.score("跨国公司加码投资", "", "");
        assert_eq!(r.axis(Axis::CorporateHierarchy), 60);
        assert_eq!(r.breakdown[&Axis::CorporateHierarchy].label, "外资企业");

        let r = scorer.score("城投债发行提速", "", "");
        assert_eq!(r.axis(Axis::CorporateHierarchy), 60);

        let r = scorer.score("某公司年报", "", "");
        assert_eq!(r.axis(Axis::CorporateHierarchy), 40);
    }

    #[test]
    fn test_food_security_special_case() {
        let r = score_news("粮食安全形势稳定", "", "");
        let industry = &r.breakdown[&Axis::StrategicIndustry];
        assert_eq!(industry.score, 80);
        assert_eq!(industry.label, "粮食安全");

        // A higher tier still overrides the food-security floor.
        let r = score_news("种业与芯片", "", "");
        assert_eq!(r.axis(Axis::StrategicIndustry), 100);
    }

    #[test]
    fn test_economic_scale_magnitudes() {
        let scorer = ContentScorer::default();

        let r = scorer.score("投资2.5万亿元", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 100);
        assert_eq!(r.breakdown[&Axis::EconomicScale].label, "2.5万亿");

        let r = scorer.score("数千亿规模", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 80);

        let r = scorer.score("融资500亿元", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 60);

        let r = scorer.score("融资50亿元", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 40);

        let r = scorer.score("融资3亿元", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 20);

        let r = scorer.score("融资3亿元，覆盖全国", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 40);
    }

    #[test]
    fn test_ascending_thresholds_are_reordered() {
        let mut rules = ScoringRules::default();
        rules.economic_thresholds.reverse();
        let scorer = ContentScorer::new(rules);

        let r = scorer.score("投资2.5万亿元", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 100);
        let r = scorer.score("融资3亿元", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 20);
        assert!(
            scorer
                .rules()
                .economic_thresholds
                .windows(2)
                .all(|w| w[0].min_yuan >= w[1].min_yuan)
        );
    }

    #[test]
    fn test_malformed_numerals_degrade_to_zero() {
        // Full-width digits match \d but are not parseable as f64.
        let r = score_news("投资１０００亿元", "", "");
        assert_eq!(r.axis(Axis::EconomicScale), 0);
        assert!(r.breakdown[&Axis::EconomicScale].label.is_empty());
    }

    #[test]
    fn test_explanation_order_and_rounding() {
        let r = score_news("国务院部署芯片产业", "", "");
        assert_eq!(
            r.explanation,
            "policy/国务院(23.8) + industry/核心战略产业(20.0) = total 43.8"
        );
    }

    #[test]
    fn test_explanation_lists_boosters() {
        let r = score_news("国务院常务会议研究芯片", "", "");
        assert!(r.explanation.contains("[boosters: state_council(x1.3)]"));
        assert!(r.explanation.starts_with("policy/国务院(23.8)"));
    }

    #[test]
    fn test_custom_tables_are_honoured() {
        let mut rules = ScoringRules::default();
        rules.geographic = vec![
            Tier::new(10, "low", &["测试"]),
            Tier::new(90, "high", &["样例"]),
        ];
        let scorer = ContentScorer::new(rules);
        let r = scorer.score("测试样例", "", "");
        let geo = &r.breakdown[&Axis::GeographicSignificance];
        assert_eq!(geo.score, 90);
        assert_eq!(geo.label, "high");
        assert_eq!(geo.evidence, vec!["样例", "测试"]);
    }
}
