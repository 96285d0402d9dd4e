//! # Catalog Digest CLI Application
//!
//! Command-line interface for the catalog digest pipeline.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands:
//!   - `digest`: discover a site's products and summarize a batch of them
//!   - `locate`: print the sitemap chain down to the product sitemap
//!   - `describe`: derive the description of a single page
//!   - `summarize`: summarize a piece of text
//!
//! Provider credentials are read from the environment (or a `.env` file):
//! `GEMINI_API_KEY` for summaries and, optionally, `SCRAPINGBEE_API_KEY` for
//! page rendering.

mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use catalog_digest::discovery::{SiteTarget, SitemapLocator};
use catalog_digest::enrichment::{
    DirectRenderer, PageDescriptionFetcher, PageRenderer, ScrapingBeeRenderer, Summarizer,
};
use catalog_digest::http::SiteClient;
use catalog_digest::model::GeminiGenerator;
use catalog_digest::pipeline::{
    CatalogDigest, CatalogPipeline, DEFAULT_LIMIT, EnrichmentProgress, PipelineConfig,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::{info, instrument};

/// Environment variable holding the ScrapingBee API key
const SCRAPINGBEE_API_KEY_ENV: &str = "SCRAPINGBEE_API_KEY";

#[derive(Parser)]
#[command(author, version, about = "Discover a site's product catalog and summarize it", long_about = None)]
struct Cli {
    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover products and enrich them with descriptions and summaries
    Digest(DigestArgs),

    /// Print the sitemap and product sitemap URLs of a site
    Locate(LocateArgs),

    /// Print the description derived from a single page
    Describe(DescribeArgs),

    /// Print the summary of a piece of text
    Summarize(SummarizeArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RendererKind {
    /// ScrapingBee when SCRAPINGBEE_API_KEY is set, direct otherwise
    Auto,
    Scrapingbee,
    Direct,
}

#[derive(Args, Debug)]
struct DigestArgs {
    /// Base URL of the site
    #[arg(required = true)]
    site: String,

    /// Number of products to enrich
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Maximum number of products enriched at once (defaults to the limit)
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Save the digest as JSON to a file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page renderer
    #[arg(short, long, value_enum, default_value = "auto")]
    renderer: RendererKind,

    /// LLM model for summaries
    #[arg(short, long, default_value = "gemini-1.5-flash")]
    model: String,

    /// Summary requests allowed per minute
    #[arg(long, default_value = "15")]
    rpm: u32,
}

#[derive(Args, Debug)]
struct LocateArgs {
    /// Base URL of the site
    #[arg(required = true)]
    site: String,
}

#[derive(Args, Debug)]
struct DescribeArgs {
    /// Product page URL
    #[arg(required = true)]
    url: String,

    /// Page renderer
    #[arg(short, long, value_enum, default_value = "auto")]
    renderer: RendererKind,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Text to summarize
    #[arg(required = true)]
    text: String,

    /// LLM model for summaries
    #[arg(short, long, default_value = "gemini-1.5-flash")]
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    match cli.command {
        Some(Commands::Digest(args)) => {
            digest_command(args).await?;
        }
        Some(Commands::Locate(args)) => {
            locate_command(args).await?;
        }
        Some(Commands::Describe(args)) => {
            describe_command(args).await?;
        }
        Some(Commands::Summarize(args)) => {
            summarize_command(args).await?;
        }
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["catalog-digest", "--help"]);
        }
    }

    Ok(())
}

/// Pick the page renderer for `kind`
fn build_renderer(kind: RendererKind, client: &SiteClient) -> anyhow::Result<Arc<dyn PageRenderer>> {
    let api_key = std::env::var(SCRAPINGBEE_API_KEY_ENV).ok();
    let renderer: Arc<dyn PageRenderer> = match (kind, api_key) {
        (RendererKind::Direct, _) | (RendererKind::Auto, None) => {
            info!("Rendering pages with direct requests");
            Arc::new(DirectRenderer::new(client.clone()))
        }
        (RendererKind::Scrapingbee, None) => {
            anyhow::bail!("{} environment variable must be set", SCRAPINGBEE_API_KEY_ENV)
        }
        (_, Some(api_key)) => {
            info!("Rendering pages with ScrapingBee");
            Arc::new(ScrapingBeeRenderer::new(client.clone(), api_key))
        }
    };
    Ok(renderer)
}

#[instrument]
async fn digest_command(args: DigestArgs) -> anyhow::Result<()> {
    let site = SiteTarget::parse(&args.site)?;

    let config = PipelineConfig::builder()
        .limit(args.limit)
        .concurrency(args.concurrency.unwrap_or(args.limit))
        .summary_model(args.model.clone())
        .requests_per_minute(args.rpm)
        .build();

    let client = SiteClient::new(&config.user_agent, config.request_timeout())?;
    let renderer = build_renderer(args.renderer, &client)?;
    let generator = GeminiGenerator::new_gemini_from_env(&config.summary_model, args.rpm)?;
    let pipeline = CatalogPipeline::with_client(client, config, renderer, Arc::new(generator));

    println!("Building digest for {}...", site);

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel::<EnrichmentProgress>(100);

    let progress_bar = ProgressBar::new(args.limit as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Enriching products...");

    // Spawn a task to process progress updates
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(update) = progress_receiver.recv().await {
                progress_bar.inc(1);
                let status = if update.degraded { "degraded" } else { "done" };
                progress_bar.set_message(format!(
                    "{} {}",
                    status,
                    update.location.as_deref().unwrap_or("<no location>")
                ));
            }
            progress_bar.finish_and_clear();
        }
    });

    let start_time = std::time::Instant::now();
    let result = pipeline.digest(&site, Some(progress_sender)).await;

    // Wait for progress task to complete (it will end when all senders are dropped)
    let _ = progress_handle.await;
    let digest = result?;

    if let Some(output_file) = &args.output {
        let json = serde_json::to_string_pretty(&digest)?;
        tokio::fs::write(output_file, json)
            .await
            .with_context(|| format!("failed to write {}", output_file.display()))?;
        println!("Saved digest to {}", output_file.display());
    }

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&digest)?);
        }
        _ => print_digest(&digest),
    }

    println!("Completed in {:.2?}", start_time.elapsed());
    Ok(())
}

fn print_digest(digest: &CatalogDigest) {
    println!("{}", digest.message);
    println!("Sitemap: {}", digest.chain.sitemap_url);
    println!("Product sitemap: {}", digest.chain.product_sitemap_url);
    println!(
        "Showing {} of {} products",
        digest.products.len(),
        digest.discovered
    );
    println!();

    for (i, product) in digest.products.iter().enumerate() {
        println!(
            "{}. {}",
            i + 1,
            product.product.location.as_deref().unwrap_or("<no location>")
        );
        if let Some(title) = product.product.images.iter().find_map(|i| i.title.as_deref()) {
            println!("   Title: {}", title);
        }
        println!("   Images: {}", product.product.images.len());
        println!("   Description: {}", product.description.display_text());
        println!("   Summary: {}", product.summary.display_text());
        println!();
    }
}

#[instrument]
async fn locate_command(args: LocateArgs) -> anyhow::Result<()> {
    let site = SiteTarget::parse(&args.site)?;
    let locator = SitemapLocator::new(SiteClient::with_defaults()?);

    let chain = locator.locate_product_sitemap(&site).await?;
    println!("Sitemap: {}", chain.sitemap_url);
    println!("Product sitemap: {}", chain.product_sitemap_url);
    Ok(())
}

#[instrument]
async fn describe_command(args: DescribeArgs) -> anyhow::Result<()> {
    let client = SiteClient::with_defaults()?;
    let renderer = build_renderer(args.renderer, &client)?;
    let describer = PageDescriptionFetcher::new(renderer);

    let description = describer.fetch_description(Some(&args.url)).await;
    if let Some(degradation) = description.degradation() {
        info!("Description degraded: {}", degradation.reason_code());
    }
    println!("{}", description.display_text());
    Ok(())
}

#[instrument(skip(args))]
async fn summarize_command(args: SummarizeArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::default();
    let generator = GeminiGenerator::new_gemini_from_env(&args.model, config.requests_per_minute)?;
    let summarizer = Summarizer::new(Arc::new(generator));

    let summary = summarizer.summarize(&args.text).await;
    if let Some(degradation) = summary.degradation() {
        info!("Summary degraded: {}", degradation.reason_code());
    }
    println!("{}", summary.display_text());
    Ok(())
}
