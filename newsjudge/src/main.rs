/*
newsjudge - main.rs
Fetches top headlines, runs them through the judge ensemble and prints the annotated articles as JSON.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsjudge::article::RawArticle;
use newsjudge::fetcher::{read_articles_file, FetchFilter, NewsApiFetcher, NewsFetcher};
use newsjudge::judge::{self, Judge};
use newsjudge::pipeline::{ArticlePipeline, PipelineOptions};

#[derive(Parser, Debug)]
#[command(name = "newsjudge", about = "Neutralize and fact-check news articles with an ensemble of AI judges")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read raw articles from a JSON file instead of calling the news API
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the annotated articles here instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the configured country filter
    #[arg(long)]
    country: Option<String>,

    /// Override the configured category filter
    #[arg(long)]
    category: Option<String>,

    /// Override the configured page size
    #[arg(long)]
    page_size: Option<u32>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging; stdout is reserved for the JSON result
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config.clone() {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    config.validate().context("invalid configuration")?;
    info!(default_path = ?default_path, override_path = ?override_path, judges = config.judges.len(), "configuration loaded");

    // Build the judge ensemble
    let judges = build_judges(&config)?;
    let options = config
        .pipeline
        .as_ref()
        .map(PipelineOptions::from)
        .unwrap_or_default();
    let pipeline = ArticlePipeline::new(judges).with_options(options);

    // Collect raw articles
    let raw_articles = match &args.input {
        Some(path) => read_articles_file(path).await?,
        None => fetch_raw_articles(&config, &args).await?,
    };

    if raw_articles.is_empty() {
        warn!("no articles to process");
    }

    // Ctrl-C cancels every in-flight judge call
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, cancelling in-flight judge calls");
            ctrl_c_token.cancel();
        }
    });

    let articles = pipeline.process_batch_cancellable(raw_articles, &cancel).await;

    let json = serde_json::to_string_pretty(&articles).context("failed to serialize articles")?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("failed to write output file: {}", path.display()))?;
            info!(path = ?path, count = articles.len(), "results written");
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Create every configured judge, reading each API key from its environment variable
fn build_judges(config: &Config) -> Result<Vec<Arc<dyn Judge>>> {
    config
        .judges
        .iter()
        .map(|judge_config| -> Result<Arc<dyn Judge>> {
            let api_key_env = judge_config.api_key_env_or_default();
            let api_key = std::env::var(api_key_env).with_context(|| {
                format!("API key env var '{}' for judge '{}' not set", api_key_env, judge_config.name)
            })?;
            info!(judge = %judge_config.name, backend = ?judge_config.backend, "judge initialized");
            Ok(judge::build_judge(judge_config, api_key))
        })
        .collect()
}

async fn fetch_raw_articles(config: &Config, args: &Args) -> Result<Vec<RawArticle>> {
    let news = config.news_api.clone().unwrap_or_default();

    let api_key_env = news
        .api_key_env
        .as_deref()
        .unwrap_or(common::DEFAULT_NEWS_API_KEY_ENV);
    let api_key = std::env::var(api_key_env)
        .with_context(|| format!("news API key env var '{}' not set", api_key_env))?;

    let fetcher = NewsApiFetcher::new(
        news.base_url.as_deref().unwrap_or(common::DEFAULT_NEWS_API_URL),
        api_key,
        news.timeout_seconds.unwrap_or(10),
    )?;

    let filter = FetchFilter {
        country: args.country.clone().or(news.country),
        category: args.category.clone().or(news.category),
        page_size: args.page_size.or(news.page_size),
    };

    fetcher.fetch(&filter).await
}
