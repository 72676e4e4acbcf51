//! Command-line interface definitions.
//!
//! Uses [`clap`] derive macros. Global options fall back to environment
//! variables so the binary can run from cron without flags.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Daily selection of Chinese economic news for expert review.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, env = "CN_NEWS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// JSON store document
    #[arg(short, long, env = "CN_NEWS_STORE", default_value = "data/news.json", global = true)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the daily selection and queue the result for review
    Select(SelectArgs),
    /// Score one article and print the result as JSON
    Score(ScoreArgs),
    /// Fetch the enabled RSS sources into the store
    Ingest,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Number of articles to queue (overrides the config file)
    #[arg(short = 'n', long)]
    pub target_count: Option<usize>,

    /// Maximum local-government articles (overrides the config file)
    #[arg(long)]
    pub max_local_gov: Option<usize>,

    /// Read and report only; leave the store untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for the JSON run report
    #[arg(short, long)]
    pub report_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    #[arg(short, long)]
    pub title: String,

    #[arg(short = 'b', long, default_value = "")]
    pub content: String,

    #[arg(long, default_value = "")]
    pub source: String,
}
