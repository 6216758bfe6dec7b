//! Pipeline runner.
//!
//! Wires credentials and feeds from the environment into one pipeline run.
//! Expected environment:
//!
//! - `BRAVE_SEARCH_API`, `BRAVE_AI_API`, `BRAVE_BASE_API` - Brave keys, in
//!   rotation priority order; at least one is needed for search fallback
//! - `ALIBABA_CLOUD_API_KEY`, `OPENROUTER_API_KEY` - extraction providers,
//!   tried in that order; at least one is required
//! - `SUPABASE_URL`, `SUPABASE_KEY` - destination (unless `--dry-run`)
//! - `DISCORD_WEBHOOK` - optional high-urgency alerts

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use intelligence::{
    keypool::{CAP_IMAGE_SEARCH, CAP_WEB_SEARCH},
    AcquisitionChain, BraveSearch, ContentItem, Credential, DedupUpsertEngine, DiscordAlerter,
    ExtractionOrchestrator, FeedReader, FeedSource, HttpFetcher, ImageFinder, KeyPool,
    MemoryStore, OpenAiChatModel, Pipeline, PostgrestStore, ProviderPlan,
};

/// Brave free-tier monthly request quota.
const BRAVE_FREE_QUOTA: u32 = 2000;

const ALIBABA_MODELS: &[&str] = &["qwen-plus", "qwen-turbo"];
const OPENROUTER_MODELS: &[&str] = &[
    "deepseek/deepseek-chat-v3-0324:free",
    "meta-llama/llama-3.3-70b-instruct:free",
];

#[derive(Parser)]
#[command(name = "intel", about = "Run the news intelligence pipeline")]
struct Args {
    /// Feed URL to process; repeatable
    #[arg(long = "feed")]
    feeds: Vec<String>,

    /// JSON file with [{"url", "name", "niche"}] feed entries
    #[arg(long)]
    feeds_file: Option<std::path::PathBuf>,

    /// Niche hint applied to feeds given with --feed
    #[arg(long)]
    niche: Option<String>,

    /// Only keep items newer than this many hours (0 disables the filter)
    #[arg(long, default_value_t = 24)]
    max_age_hours: i64,

    /// Process into an in-memory store and report, writing nothing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Deserialize)]
struct FeedEntry {
    url: String,
    name: Option<String>,
    niche: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let sources = feed_sources(&args)?;
    if sources.is_empty() {
        bail!("no feeds given; use --feed or --feeds-file");
    }

    let pipeline = build_pipeline(&args)?;

    let max_age = (args.max_age_hours > 0).then(|| chrono::Duration::hours(args.max_age_hours));
    let reader = FeedReader::new().with_max_age(max_age);

    let mut items: Vec<ContentItem> = Vec::new();
    for source in &sources {
        match reader.fetch_items(source).await {
            Ok(mut fetched) => {
                info!(url = %source.url, items = fetched.len(), "feed read");
                items.append(&mut fetched);
            }
            Err(e) => warn!(url = %source.url, error = %e, "feed skipped"),
        }
    }

    let report = pipeline.run(&items).await;
    println!(
        "processed {} | stored {} | no signal {} | no content {} | extraction failed {} | failed {} | duplicates {}",
        report.processed,
        report.stored,
        report.no_signal,
        report.no_content,
        report.extraction_failed,
        report.failed,
        report.duplicates,
    );
    Ok(())
}

fn feed_sources(args: &Args) -> Result<Vec<FeedSource>> {
    let mut sources = Vec::new();

    for url in &args.feeds {
        let mut source = FeedSource::new(url);
        if let Some(niche) = &args.niche {
            source = source.with_niche(niche);
        }
        sources.push(source);
    }

    if let Some(path) = &args.feeds_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let entries: Vec<FeedEntry> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        for entry in entries {
            let mut source = FeedSource::new(entry.url);
            if let Some(name) = entry.name {
                source = source.with_name(name);
            }
            if let Some(niche) = entry.niche {
                source = source.with_niche(niche);
            }
            sources.push(source);
        }
    }

    Ok(sources)
}

fn build_pipeline(args: &Args) -> Result<Pipeline> {
    // Brave keys in priority order; each serves web and image search.
    let mut pool = KeyPool::new();
    for (id, var) in [
        ("brave-search", "BRAVE_SEARCH_API"),
        ("brave-ai", "BRAVE_AI_API"),
        ("brave-base", "BRAVE_BASE_API"),
    ] {
        if let Ok(key) = std::env::var(var) {
            pool = pool
                .with_credential(Credential::new(
                    id,
                    CAP_WEB_SEARCH,
                    key.clone(),
                    Some(BRAVE_FREE_QUOTA),
                ))
                .with_credential(Credential::new(
                    format!("{id}-img"),
                    CAP_IMAGE_SEARCH,
                    key,
                    Some(BRAVE_FREE_QUOTA),
                ));
        }
    }
    if !pool.has_capability(CAP_WEB_SEARCH) {
        warn!("no Brave keys configured; search fallback will be unavailable");
    }
    let pool = Arc::new(pool);
    let search = Arc::new(BraveSearch::new(pool));

    let mut plans = Vec::new();
    if let Ok(key) = std::env::var("ALIBABA_CLOUD_API_KEY") {
        plans.push(ProviderPlan::new(
            Arc::new(OpenAiChatModel::alibaba(key)),
            ALIBABA_MODELS,
        ));
    }
    if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
        plans.push(ProviderPlan::new(
            Arc::new(OpenAiChatModel::openrouter(key)),
            OPENROUTER_MODELS,
        ));
    }
    if plans.is_empty() {
        bail!("no extraction providers; set ALIBABA_CLOUD_API_KEY or OPENROUTER_API_KEY");
    }

    let engine = if args.dry_run {
        info!("dry run: writing to an in-memory store");
        DedupUpsertEngine::new(Arc::new(MemoryStore::new()))
    } else {
        let url = std::env::var("SUPABASE_URL").context("SUPABASE_URL is required")?;
        let key = std::env::var("SUPABASE_KEY").context("SUPABASE_KEY is required")?;
        DedupUpsertEngine::new(Arc::new(PostgrestStore::new(url, key)))
    };

    let chain = AcquisitionChain::new(Arc::new(HttpFetcher::new()), search.clone());
    let orchestrator = ExtractionOrchestrator::new(plans);

    let mut pipeline = Pipeline::new(chain, orchestrator, engine)
        .with_image_finder(ImageFinder::new().with_searcher(search));

    if let Ok(webhook) = std::env::var("DISCORD_WEBHOOK") {
        pipeline = pipeline.with_alerter(Arc::new(DiscordAlerter::new(webhook)));
    }

    Ok(pipeline)
}
