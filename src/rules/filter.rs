//! Tables for the admissibility gate, priority score, duplicate detector and balancer.

use super::words;
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keywords that vote for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Title-similarity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupRules {
    /// Jaccard score at or above which two titles are the same story.
    pub threshold: f64,
    pub stopwords: Vec<String>,
    /// Topic words that count as "core" overlaps for the similarity bonus.
    pub core_topics: Vec<String>,
}

impl Default for DedupRules {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            stopwords: words(&[
                "的", "了", "在", "是", "与", "和", "或", "等", "将", "被", "对", "为", "已", "正", "可",
                "也", "都", "又", "再", "更", "最", "这", "那", "有", "中", "上", "下", "内", "外", "前",
                "后", "新", "大", "小", "多", "少", "今日", "今天", "昨日", "昨天", "本周", "本月",
                "今年", "去年", "据悉", "据称", "据报道", "消息", "快讯", "速递", "盘中必读", "推出",
                "发布", "宣布", "公布", "表示", "称", "显示", "报告",
            ]),
            core_topics: words(&[
                "沪深", "交易所", "北交所", "上交所", "深交所", "证监会", "央行", "发改委", "工信部",
                "财政部", "商务部", "国资委", "IPO", "再融资", "并购", "重组", "增发", "配股", "减持",
                "增持", "融资", "债券", "股票", "基金", "ETF", "利率", "降息", "降准", "LPR", "汇率",
                "AI", "人工智能", "芯片", "半导体", "新能源", "光伏", "电池", "汽车", "航天", "航空",
                "机器人", "量子", "5G", "6G", "特斯拉", "华为", "腾讯", "阿里", "百度", "比亚迪",
                "宁德时代",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Opinion, column and advertorial markers. Applies to every source.
    pub excluded_keywords: Vec<String>,
    /// Regexes for numbers with units; a hit means the story carries data.
    pub data_patterns: Vec<String>,
    pub concrete_keywords: Vec<String>,
    /// Personnel and internal-memo markers of administrative notices.
    pub government_admin_keywords: Vec<String>,
    /// Regexes for one-line corporate announcements.
    pub brief_news_patterns: Vec<String>,
    pub local_gov_sources: Vec<String>,
    pub central_sources: Vec<String>,
    /// Sources whose notices are exempt from the administrative-notice gates.
    pub central_gov_sources: Vec<String>,
    /// Declared order doubles as the tie-break when votes are equal.
    pub categories: Vec<CategoryKeywords>,
    pub source_priority: BTreeMap<String, i32>,
    pub default_source_priority: i32,
    pub fact_rich_keywords: Vec<String>,
    pub broad_scope_keywords: Vec<String>,
    pub deep_analysis_keywords: Vec<String>,
    pub foreign_keywords: Vec<String>,
    pub domestic_keywords: Vec<String>,
    /// Empirical ceiling used to normalize the formal score onto 0..=100.
    /// Tunable; it has no derivation beyond observed score ranges.
    pub formal_max: f64,
    pub dedup: DedupRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        let categories = vec![
            CategoryKeywords {
                category: Category::Policy,
                keywords: words(&["政策", "政府", "通知", "规划", "强制", "意见"]),
            },
            CategoryKeywords {
                category: Category::Macro,
                keywords: words(&[
                    "经济", "增长", "消费", "投资", "货币", "利率", "储蓄", "人口", "劳动", "出口", "进口",
                    "贸易", "一带一路",
                ]),
            },
            CategoryKeywords {
                category: Category::Industry,
                keywords: words(&["制造", "产业", "工业", "上游", "下游", "开发区", "产业园区"]),
            },
            CategoryKeywords {
                category: Category::Energy,
                keywords: words(&[
                    "能源", "电力", "电池", "新能源", "太阳能", "光伏", "氢能", "核能", "核聚变", "钍能",
                    "风能", "风电", "地热",
                ]),
            },
            CategoryKeywords {
                category: Category::Finance,
                keywords: words(&["银行", "金融", "融资", "股票", "债券", "证券", "上市"]),
            },
            CategoryKeywords {
                category: Category::Corporate,
                keywords: words(&["企业", "公司", "股", "高管", "并购", "股东", "项目"]),
            },
            CategoryKeywords {
                category: Category::Tech,
                keywords: words(&[
                    "技术", "科技", "AI", "机器人", "无人机", "智能制造", "生物", "自动驾驶", "超算", "量子",
                    "航天", "新材料", "6G", "5G", "3D打印",
                ]),
            },
        ];

        let source_priority = [
            ("people", 11),
            ("caixin", 10),
            ("ce", 10),
            ("stcn", 9),
            ("36kr", 8),
            ("huxiu", 8),
            ("beijing_gov", 4),
            ("shanghai_gov", 4),
            ("shenzhen_gov", 3),
            ("cls", 9),
            ("jiemian", 8),
            ("yicai", 10),
            ("sina_finance", 8),
            ("21jingji", 9),
            ("xinhua_finance", 10),
            ("bbtnews", 6),
            ("stdaily", 9),
            ("cnstock", 9),
            ("sznews", 5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            excluded_keywords: words(&[
                "论评", "专栏", "社论", "观点", "评论", "投稿", "广告", "PR", "新闻稿", "赞助", "专题", "访谈",
                "座谈", "论坛", "活动", "开幕",
            ]),
            data_patterns: words(&[
                r"\d+%",
                r"\d+亿",
                r"\d+万",
                r"\d+兆",
                r"\d+元",
                r"\d+\.\d+%",
            ]),
            concrete_keywords: words(&[
                "发布", "公布", "统计", "数据", "报告", "政策", "措施", "方案", "规定", "条例", "增长", "下降",
                "上涨", "下跌", "同比", "环比",
            ]),
            government_admin_keywords: words(&[
                "人事任免",
                "干部",
                "党委",
                "组织部",
                "纪委",
                "关于印发",
                "办公厅关于",
                "工作方案",
                "管理办法",
                "人民政府办公",
                "通知如下",
                "现印发给你们",
            ]),
            brief_news_patterns: words(&[
                r"现代汽车.*计划",
                r"丰田.*计划",
                r"本田.*计划",
                r"(现代|丰田|本田|日产|大众|通用|福特).*投资.*[万亿韩元|美元|欧元]",
                r".*：对公司.*产品售价.*调整",
                r".*拟.*收购.*深交所问询",
            ]),
            local_gov_sources: words(&[
                "beijing_gov",
                "shanghai_gov",
                "shenzhen_gov",
                "bbtnews",
                "sznews",
            ]),
            central_sources: words(&[
                "people",
                "ce",
                "caixin",
                "36kr",
                "stcn",
                "huxiu",
                "cls",
                "jiemian",
                "yicai",
                "sina_finance",
                "21jingji",
                "xinhua_finance",
                "stdaily",
                "cnstock",
            ]),
            central_gov_sources: words(&["gov_cn", "ndrc", "mof", "pboc", "mofcom"]),
            categories,
            source_priority,
            default_source_priority: 5,
            fact_rich_keywords: words(&[
                "数据显示", "统计", "报告", "调查", "研究", "分析", "同比", "环比", "增长", "下降", "达到",
                "突破", "第一", "首次", "创新高", "创新低", "历史", "全国", "全球", "行业", "市场", "规模",
            ]),
            broad_scope_keywords: words(&[
                "全国", "全球", "国际", "行业", "市场", "宏观", "政策", "战略", "规划", "改革", "转型",
            ]),
            deep_analysis_keywords: words(&[
                "深度", "分析", "解读", "专访", "独家", "调研", "背后", "原因", "影响", "趋势", "展望",
            ]),
            foreign_keywords: words(&["美国", "欧洲", "日本", "韩国", "东南亚", "国际"]),
            domestic_keywords: words(&["中国", "国内", "本土", "央行", "发改委", "工信部"]),
            formal_max: 40.0,
            dedup: DedupRules::default(),
        }
    }
}

/// Caps and ordering for the category balancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceRules {
    /// Phase 1 visits categories in exactly this order.
    pub category_order: Vec<Category>,
    /// Explicit per-source caps that apply in both phases.
    pub source_max_count: BTreeMap<String, usize>,
    pub phase_one_source_cap: usize,
    pub phase_two_source_cap: usize,
}

impl Default for BalanceRules {
    fn default() -> Self {
        Self {
            category_order: vec![
                Category::Tech,
                Category::Industry,
                Category::Energy,
                Category::Corporate,
                Category::Finance,
                Category::Policy,
                Category::Macro,
            ],
            source_max_count: BTreeMap::from([("shenzhen_gov".to_string(), 1)]),
            phase_one_source_cap: 2,
            phase_two_source_cap: 3,
        }
    }
}
