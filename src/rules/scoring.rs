//! Tables for the eight-axis content scorer.

use super::{Tier, words};
use crate::models::Axis;
use serde::{Deserialize, Serialize};

/// Per-axis weights of the composite score. They sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisWeights {
    pub policy_hierarchy: f64,
    pub corporate_hierarchy: f64,
    pub strategic_industry: f64,
    pub economic_scale: f64,
    pub geographic_significance: f64,
    pub time_sensitivity: f64,
    pub international_impact: f64,
    pub social_impact: f64,
}

impl AxisWeights {
    pub fn weight(&self, axis: Axis) -> f64 {
        match axis {
            Axis::PolicyHierarchy => self.policy_hierarchy,
            Axis::CorporateHierarchy => self.corporate_hierarchy,
            Axis::StrategicIndustry => self.strategic_industry,
            Axis::EconomicScale => self.economic_scale,
            Axis::GeographicSignificance => self.geographic_significance,
            Axis::TimeSensitivity => self.time_sensitivity,
            Axis::InternationalImpact => self.international_impact,
            Axis::SocialImpact => self.social_impact,
        }
    }
}

impl Default for AxisWeights {
    fn default() -> Self {
        Self {
            policy_hierarchy: 0.25,
            corporate_hierarchy: 0.15,
            strategic_industry: 0.20,
            economic_scale: 0.15,
            geographic_significance: 0.10,
            time_sensitivity: 0.05,
            international_impact: 0.05,
            social_impact: 0.05,
        }
    }
}

/// Keyword groups used to place an article on the corporate ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorporateKeywords {
    pub central_soe: Vec<String>,
    pub listed: Vec<String>,
    pub unicorn: Vec<String>,
    pub foreign: Vec<String>,
    pub local_soe: Vec<String>,
    /// Bare mentions of "a company" that earn the bottom rung.
    pub generic: Vec<String>,
}

impl Default for CorporateKeywords {
    fn default() -> Self {
        Self {
            central_soe: words(&["央企", "中央企业", "国资委监管企业", "中管企业"]),
            listed: words(&["上市公司", "科创板", "创业板", "A股公司", "港股上市"]),
            unicorn: words(&["独角兽"]),
            foreign: words(&["外资企业", "外企", "跨国公司", "外商独资", "合资企业"]),
            local_soe: words(&["地方国企", "省属国企", "市属国企", "城投", "省国资委"]),
            generic: words(&["企业", "公司", "集团"]),
        }
    }
}

/// Minimum amount (in yuan) that earns `score` on the economic-scale axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountThreshold {
    pub min_yuan: f64,
    pub score: u32,
}

/// Additive bonus for keywords signalling how far an effect reaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeBonus {
    pub bonus: u32,
    pub keywords: Vec<String>,
}

/// A multiplier applied once when any of its keywords appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordBooster {
    pub name: String,
    pub multiplier: f64,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub weights: AxisWeights,
    pub policy_hierarchy: Vec<Tier>,
    pub central_soes: Vec<String>,
    pub major_private_corps: Vec<String>,
    pub corporate_keywords: CorporateKeywords,
    /// Sector words that turn a central SOE mention into the strategic rung.
    pub strategic_soe_keywords: Vec<String>,
    pub strategic_industries: Vec<Tier>,
    pub food_security: Tier,
    /// Ordered from the largest amount down; first match wins.
    pub economic_thresholds: Vec<AmountThreshold>,
    pub impact_scope: Vec<ScopeBonus>,
    pub geographic: Vec<Tier>,
    pub time_sensitivity: Vec<Tier>,
    pub international_impact: Vec<Tier>,
    pub social_impact: Vec<Tier>,
    pub boosters: Vec<KeywordBooster>,
    pub soe_strategic_multiplier: f64,
    pub soe_strategic_min_industry: u32,
    /// Ceiling on the compounded booster product.
    pub booster_cap: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            weights: AxisWeights::default(),
            policy_hierarchy: vec![
                Tier::new(
                    100,
                    "全国人大",
                    &["全国人大", "全国人民代表大会", "人大常委会", "全国两会"],
                ),
                Tier::new(95, "国务院", &["国务院", "国常会", "中共中央办公厅"]),
                Tier::new(
                    80,
                    "部委",
                    &[
                        "发改委",
                        "财政部",
                        "商务部",
                        "工信部",
                        "央行",
                        "人民银行",
                        "证监会",
                        "国资委",
                        "金融监管总局",
                        "海关总署",
                        "国家统计局",
                    ],
                ),
                Tier::new(60, "省级", &["省政府", "省委", "自治区政府", "省人民政府"]),
                Tier::new(40, "市级", &["市政府", "市委", "市人民政府"]),
                Tier::new(20, "县级", &["县政府", "区政府", "县委"]),
            ],
            central_soes: words(&[
                "中国石油",
                "中国石化",
                "中国海油",
                "国家电网",
                "南方电网",
                "中国移动",
                "中国电信",
                "中国联通",
                "中国建筑",
                "中国中车",
                "中国船舶",
                "航天科技",
                "航天科工",
                "中国商飞",
                "国家能源集团",
                "中国华能",
                "中粮集团",
                "中国宝武",
                "中国中铁",
                "中国铁建",
                "中国电科",
            ]),
            major_private_corps: words(&[
                "华为",
                "腾讯",
                "阿里巴巴",
                "百度",
                "京东",
                "字节跳动",
                "美团",
                "比亚迪",
                "宁德时代",
                "小米",
                "拼多多",
                "吉利",
                "大疆",
                "蔚来",
                "理想汽车",
            ]),
            corporate_keywords: CorporateKeywords::default(),
            strategic_soe_keywords: words(&[
                "能源", "电网", "石油", "军工", "航天", "通信", "粮食", "船舶", "芯片", "半导体",
            ]),
            strategic_industries: vec![
                Tier::new(
                    100,
                    "核心战略产业",
                    &[
                        "半导体",
                        "芯片",
                        "集成电路",
                        "人工智能",
                        "量子",
                        "航天",
                        "光刻",
                        "大模型",
                    ],
                ),
                Tier::new(
                    80,
                    "重要新兴产业",
                    &[
                        "新能源",
                        "光伏",
                        "储能",
                        "锂电",
                        "新能源汽车",
                        "生物医药",
                        "高端装备",
                        "机器人",
                        "5G",
                        "6G",
                        "低空经济",
                    ],
                ),
                Tier::new(75, "金融", &["银行", "证券", "保险", "金融", "基金"]),
                Tier::new(60, "房地产", &["房地产", "楼市", "住房", "房企"]),
                Tier::new(40, "传统产业", &["纺织", "钢铁", "煤炭", "化工", "零售", "餐饮"]),
            ],
            food_security: Tier::new(80, "粮食安全", &["粮食安全", "粮食生产", "耕地保护", "种业"]),
            economic_thresholds: vec![
                AmountThreshold {
                    min_yuan: 1e12,
                    score: 100,
                },
                AmountThreshold {
                    min_yuan: 1e11,
                    score: 80,
                },
                AmountThreshold {
                    min_yuan: 1e10,
                    score: 60,
                },
                AmountThreshold {
                    min_yuan: 1e9,
                    score: 40,
                },
                AmountThreshold {
                    min_yuan: 1e8,
                    score: 20,
                },
            ],
            impact_scope: vec![
                ScopeBonus {
                    bonus: 20,
                    keywords: words(&["全国", "全球", "全行业"]),
                },
                ScopeBonus {
                    bonus: 10,
                    keywords: words(&["跨省", "多个省份", "区域"]),
                },
                ScopeBonus {
                    bonus: 5,
                    keywords: words(&["全市", "全省"]),
                },
            ],
            geographic: vec![
                Tier::new(100, "京沪", &["北京", "上海"]),
                Tier::new(85, "深广", &["深圳", "广州"]),
                Tier::new(
                    80,
                    "特区新区",
                    &["雄安", "浦东", "前海", "横琴", "自贸区", "自贸港", "粤港澳大湾区", "长三角"],
                ),
                Tier::new(
                    60,
                    "省级地区",
                    &["江苏", "浙江", "广东", "山东", "四川", "湖北", "福建", "河南", "安徽"],
                ),
            ],
            time_sensitivity: vec![
                Tier::new(100, "突发", &["突发", "紧急", "刚刚"]),
                Tier::new(90, "当日", &["今日", "今天", "当日"]),
                Tier::new(70, "短期", &["本周", "近日", "即将"]),
                Tier::new(50, "中长期", &["年内", "十五五", "中长期", "规划"]),
            ],
            international_impact: vec![
                Tier::new(100, "中美关系", &["中美", "美国关税", "对美", "贸易摩擦"]),
                Tier::new(90, "供应链", &["供应链", "产业链"]),
                Tier::new(80, "一带一路", &["一带一路"]),
                Tier::new(75, "外资", &["外资", "外商投资", "FDI"]),
                Tier::new(60, "国际贸易", &["出口", "进口", "国际"]),
            ],
            social_impact: vec![
                Tier::new(100, "就业", &["就业", "失业", "稳岗"]),
                Tier::new(90, "民生", &["民生", "物价", "养老", "医保", "消费"]),
                Tier::new(80, "环境", &["环保", "碳排放", "污染", "碳中和"]),
                Tier::new(60, "公共安全", &["安全生产", "食品安全", "公共安全"]),
            ],
            boosters: vec![
                KeywordBooster {
                    name: "top_leadership".to_string(),
                    multiplier: 1.5,
                    keywords: words(&["习近平", "总书记", "中央政治局", "中央经济工作会议"]),
                },
                KeywordBooster {
                    name: "state_council".to_string(),
                    multiplier: 1.3,
                    keywords: words(&["国务院常务会议", "国常会", "国务院印发", "国务院发布"]),
                },
            ],
            soe_strategic_multiplier: 1.2,
            soe_strategic_min_industry: 80,
            booster_cap: 1.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = AxisWeights::default();
        let sum: f64 = Axis::ALL.iter().map(|a| w.weight(*a)).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tiers_are_declared_highest_first() {
        let rules = ScoringRules::default();
        for table in [
            &rules.policy_hierarchy,
            &rules.strategic_industries,
            &rules.geographic,
            &rules.time_sensitivity,
            &rules.international_impact,
            &rules.social_impact,
        ] {
            assert!(table.windows(2).all(|w| w[0].score > w[1].score));
        }
    }
}
