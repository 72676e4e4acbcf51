//! # cn_econ_news
//!
//! Daily selection of Chinese economic news for expert review.
//!
//! ## Usage
//!
//! ```sh
//! cn_econ_news ingest
//! cn_econ_news select --report-dir ./reports
//! cn_econ_news score --title "国务院常务会议部署集成电路产业发展" --content "..."
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

use chrono::Utc;
use clap::Parser;
use cn_econ_news::config::AppConfig;
use cn_econ_news::fetch::{self, RetryFetch, RssFetcher};
use cn_econ_news::outputs::json::write_report;
use cn_econ_news::utils::ensure_writable_dir;
use cn_econ_news::{
    CategoryBalancer, ContentScorer, DailySelector, JsonFileStore, NewsFilter, Rules,
};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command, ScoreArgs, SelectArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.config, store = %args.store.display(), "Parsed CLI arguments");

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    let result = match args.command {
        Command::Select(select) => run_select(&config, &args.store, select).await,
        Command::Score(score) => run_score(&config, score),
        Command::Ingest => run_ingest(&config, &args.store).await,
    };

    match result {
        Ok(()) => {
            info!(elapsed_ms = start_time.elapsed().as_millis(), "Done");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
    }
}

fn load_rules(config: &AppConfig) -> Result<Rules, Box<dyn Error>> {
    config.rules().map_err(|e| {
        error!(error = %e, path = ?config.rules_path, "Failed to load rule tables");
        e.into()
    })
}

#[instrument(level = "info", skip_all, fields(store = %store_path.display(), dry_run = args.dry_run))]
async fn run_select(
    config: &AppConfig,
    store_path: &Path,
    args: SelectArgs,
) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = &args.report_dir {
        ensure_writable_dir(dir).await?;
    }

    let rules = load_rules(config)?;
    let scorer = Arc::new(ContentScorer::new(rules.scoring));
    let filter = NewsFilter::new(Arc::new(rules.filter), scorer)?
        .with_dedup(config.selection.dedup_enabled);
    let balancer = CategoryBalancer::new(rules.balance);

    let mut params = config.selection_params(args.dry_run);
    if let Some(n) = args.target_count {
        params.target_count = n;
    }
    if let Some(n) = args.max_local_gov {
        params.max_local_gov = n;
    }

    let selector = DailySelector::new(JsonFileStore::new(store_path), filter, balancer, params);
    let report = selector.run_daily_selection().await?;

    if let Some(dir) = &args.report_dir {
        write_report(&report, dir).await?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_score(config: &AppConfig, args: ScoreArgs) -> Result<(), Box<dyn Error>> {
    let rules = load_rules(config)?;
    let scorer = ContentScorer::new(rules.scoring);
    let result = scorer.score(&args.title, &args.content, &args.source);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[instrument(level = "info", skip_all, fields(store = %store_path.display()))]
async fn run_ingest(config: &AppConfig, store_path: &Path) -> Result<(), Box<dyn Error>> {
    let ingest = &config.ingest;
    let fetchers = config
        .enabled_sources()
        .map(|source| {
            let rss = RssFetcher::new(
                source.key.clone(),
                source.rss.clone(),
                ingest.max_items_per_source,
                StdDuration::from_secs(ingest.timeout_secs),
            )?;
            Ok(RetryFetch::new(
                rss,
                ingest.max_retries,
                StdDuration::from_millis(ingest.base_delay_ms),
            ))
        })
        .collect::<Result<Vec<_>, cn_econ_news::FetchError>>()?;
    info!(sources = fetchers.len(), "Starting ingest");

    let store = JsonFileStore::new(store_path);
    let summary = fetch::ingest(&fetchers, &store, &ingest.relevance_keywords, Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
