/*
hotnews - single-pass batch job.
Fetches the configured hot news feeds, summarizes each item, renders chat blocks
and posts them to the configured webhook (or prints them on a dry run).
*/

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use common::{Config, SourceRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use hotnews::delivery::SlackWebhook;
use hotnews::driver::AggregationDriver;
use hotnews::ingestion::FeedFetcher;
use hotnews::llm::remote::RemoteLlmProvider;
use hotnews::llm::{AiSummarizer, LlmProvider};
use hotnews::pipeline::SourcePipeline;
use hotnews::scraping::ArticleScraper;
use hotnews::text::TextSummarizer;

#[derive(Parser, Debug)]
#[command(name = "hotnews", about = "Aggregate hot news feeds into chat blocks")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run only these source keys (repeatable), in the given order
    #[arg(long = "source", value_name = "KEY")]
    sources: Vec<String>,

    /// Date shown in block headers (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the blocks as JSON instead of posting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = load_config(args.config.as_deref()).await?;

    let registry = SourceRegistry::from_file(&config.sources.file).await?;
    let keys = if args.sources.is_empty() {
        config.sources.enabled.clone()
    } else {
        args.sources.clone()
    };
    let sources = registry.select(&keys)?;
    info!(count = sources.len(), "sources selected: {:?}", sources.iter().map(|s| &s.key).collect::<Vec<_>>());

    let fetcher = Arc::new(FeedFetcher::from_config(&config.aggregator)?);
    let ai = match create_llm_provider(&config)? {
        Some(provider) => Some(AiSummarizer::new(
            provider,
            config.summary.prompt(),
            Duration::from_secs(config.summary.ai_timeout_seconds()),
        )),
        None => {
            info!("AI summaries disabled, using description text only");
            None
        }
    };

    let pipeline = SourcePipeline::new(fetcher, ai, TextSummarizer::new(config.summary.max_chars()))
        .with_max_items(config.aggregator.max_items())
        .with_concurrency(config.summary.concurrency());

    let mut driver = AggregationDriver::new(
        pipeline,
        Duration::from_secs(config.driver.source_timeout_seconds()),
    );
    if let Some(date) = args.date {
        driver = driver.with_date(date);
    }

    info!(as_of = %driver.as_of(), "building hot news blocks");
    let blocks = driver.run(&sources).await;
    info!("rendered {} blocks", blocks.len());

    let webhook = if args.dry_run {
        None
    } else {
        config.delivery.as_ref().and_then(SlackWebhook::from_config)
    };

    match webhook {
        Some(webhook) => {
            let webhook = webhook.with_timeout(config.aggregator.timeout_seconds());
            if let Err(e) = webhook.send(&blocks).await {
                error!("delivery failed: {:#}", e);
                return Err(e);
            }
        }
        None => {
            if !args.dry_run {
                warn!("no webhook configured, printing blocks instead");
            }
            let json = serde_json::to_string_pretty(&serde_json::json!({ "blocks": blocks }))?;
            println!("{}", json);
        }
    }

    info!("hotnews run finished");
    Ok(())
}

/// Resolve `config.default.toml` + the override file and merge them.
async fn load_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            anyhow::bail!("Config file not found: {}", p.display());
        }
        Some(p.to_path_buf())
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    .context("failed to load configuration")?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}

/// Create the answer provider described by `[llm]`, if any.
fn create_llm_provider(config: &Config) -> Result<Option<Arc<dyn LlmProvider>>> {
    let Some(llm_config) = config.llm.as_ref() else {
        return Ok(None);
    };
    let adapter = llm_config.adapter.as_deref().unwrap_or("none");
    match adapter {
        "none" => Ok(None),
        "remote" => {
            let remote_config = llm_config
                .remote
                .as_ref()
                .context("Remote adapter selected but no [llm.remote] section found")?;

            let api_key_env = remote_config
                .api_key_env
                .as_deref()
                .context("Missing api_key_env in remote config")?;
            let api_key = std::env::var(api_key_env)
                .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))?;

            let model = remote_config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
            let api_url = remote_config
                .api_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434/v1/chat/completions".to_string());
            let timeout_secs = remote_config.timeout_seconds.unwrap_or(120);
            let max_tokens = remote_config.max_tokens.unwrap_or(500);
            let article_max_chars = remote_config.article_max_chars.unwrap_or(12_000);

            info!("LLM provider initialized: {} via {}", model, api_url);
            let provider = RemoteLlmProvider::new(api_url, api_key, model)?
                .with_defaults(timeout_secs, max_tokens, 0.7)
                .with_scraper(ArticleScraper::new(config.aggregator.timeout_seconds(), article_max_chars)?);
            Ok(Some(Arc::new(provider)))
        }
        _ => anyhow::bail!("Unknown LLM adapter type: {}", adapter),
    }
}
