//! # cn_econ_news
//!
//! Selects a small, diverse, high-value set of Chinese economic news items
//! each day for expert review.
//!
//! ## Pipeline
//!
//! 1. **Ingest**: RSS sources are fetched into the store ([`fetch`])
//! 2. **Score**: every candidate gets an eight-axis content score ([`scorer`])
//! 3. **Filter**: low-value, administrative and duplicate items are dropped ([`filter`], [`dedup`])
//! 4. **Balance**: a category- and source-quota pass picks the final set ([`balancer`])
//! 5. **Queue**: the selection is marked for review in the store ([`selector`], [`store`])
//!
//! Rule tables live in [`rules`]; they are built once and shared read-only.

pub mod balancer;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod outputs;
pub mod rules;
pub mod scorer;
pub mod selector;
pub mod store;
pub mod utils;

pub use balancer::{CategoryBalancer, balance_categories};
pub use config::AppConfig;
pub use dedup::{DuplicateDetector, extract_title_keywords, is_duplicate, similarity};
pub use error::{ConfigError, FetchError, SelectionError, StoreError};
pub use filter::{FilterOutcome, NewsFilter, RejectReason, filter_news};
pub use models::{Candidate, Category, ContentScoreResult, ScoredCandidate, SelectionReport};
pub use rules::Rules;
pub use scorer::{ContentScorer, score_news};
pub use selector::{DailySelector, SelectionParams};
pub use store::{JsonFileStore, MemoryStore, NewsStore};
