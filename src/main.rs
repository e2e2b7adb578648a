//! # sitesage CLI Application
//!
//! Command-line entry point for the crawl / index / ask pipeline.
//!
//! ## Subcommands
//!
//! - `crawl`: crawl seeds, store page metadata and index page content
//! - `ask`: answer one question from the index
//! - `serve`: run the Ask endpoint, optionally crawling first
//!
//! The provider (OpenAI or Gemini), its key, the database path, the answer
//! instruction and the listen address come from the environment; crawl
//! tuning comes from flags.

mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rig::{completion::CompletionModel, embeddings::EmbeddingModel};
use sitesage::api::create_router;
use sitesage::config::{ProviderKind, Settings};
use sitesage::context::RagContext;
use sitesage::crawler::{CrawlSummary, Crawler, CrawlerConfig, HttpFetcher, VisitedTracker};
use sitesage::index::Database;
use sitesage::model::{Client, gemini_client, openai_client};
use sitesage::prelude::Result;
use sitesage::search::{AnswerConfig, Answerer};
use tracing::{error, info, instrument};

#[derive(Parser)]
#[command(author, version, about = "Crawl a set of websites and answer questions about them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl seed URLs and index their content
    Crawl(CrawlArgs),

    /// Answer a question from the index
    Ask(AskArgs),

    /// Serve the Ask endpoint
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct CrawlOptions {
    /// Allowed domain (host substring); repeat for several. Defaults to conestogac.on.ca
    #[arg(long = "domain", value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Crawl depth from each seed
    #[arg(short, long, default_value = "1")]
    depth: u32,

    /// Maximum number of pages to fetch
    #[arg(short = 'p', long, default_value = "500")]
    max_pages: u32,

    /// Pages fetched in parallel per seed
    #[arg(short, long, default_value = "1")]
    concurrency: usize,

    /// Tag to strip before markdown conversion; repeat for several. Defaults to script, noscript, style
    #[arg(long = "remove-tag", value_name = "TAG")]
    remove_tags: Vec<String>,

    /// Visited-URL log
    #[arg(long, default_value = "visited_urls.txt")]
    visited_log: PathBuf,
}

impl CrawlOptions {
    fn config(&self) -> CrawlerConfig {
        let mut builder = CrawlerConfig::builder()
            .max_depth(self.depth)
            .max_pages(self.max_pages)
            .concurrency(self.concurrency)
            .visited_log(self.visited_log.clone());
        if !self.domains.is_empty() {
            builder = builder.allowed_domains(self.domains.clone());
        }
        if !self.remove_tags.is_empty() {
            builder = builder.remove_tags(self.remove_tags.clone());
        }
        builder.build()
    }
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Seed URLs
    #[arg(required = true)]
    seeds: Vec<String>,

    #[command(flatten)]
    options: CrawlOptions,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// The question
    #[arg(required = true)]
    question: String,

    /// Session identifier used for log correlation
    #[arg(short, long, default_value = "cli")]
    session: String,

    /// Number of documents retrieved
    #[arg(short = 'k', long, default_value = "3")]
    top_k: usize,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Seed URLs to crawl alongside the server
    seeds: Vec<String>,

    /// Finish crawling the seeds before accepting requests
    #[arg(long)]
    crawl_first: bool,

    /// Number of documents retrieved per question
    #[arg(short = 'k', long, default_value = "3")]
    top_k: usize,

    #[command(flatten)]
    options: CrawlOptions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber();

    let settings = Settings::from_env()?;
    let api_key = settings.provider.api_key.clone();

    match settings.provider.kind {
        ProviderKind::OpenAi => run(openai_client(&api_key), &settings, cli.command).await?,
        ProviderKind::Gemini => run(gemini_client(&api_key), &settings, cli.command).await?,
    }
    Ok(())
}

async fn run<C, E>(client: Client<C, E>, settings: &Settings, command: Commands) -> Result<()>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    let db = Database::new_from_path(
        &settings.database_path.to_string_lossy(),
        client.embedding().ndims(),
    )
    .await?;
    let ctx = RagContext::new(client, db);

    match command {
        Commands::Crawl(args) => {
            crawl_command(&ctx, args.seeds, &args.options).await?;
        }
        Commands::Ask(args) => {
            ask_command(&ctx, settings, args).await?;
        }
        Commands::Serve(args) => {
            serve_command(ctx, settings, args).await?;
        }
    }

    Ok(())
}

fn answer_config(settings: &Settings, top_k: usize) -> AnswerConfig {
    AnswerConfig::builder()
        .top_k(top_k)
        .instruction(settings.instruction.clone())
        .build()
}

#[instrument(skip(ctx, options))]
async fn crawl_command<C, E>(
    ctx: &RagContext<C, E, Database>,
    seeds: Vec<String>,
    options: &CrawlOptions,
) -> Result<CrawlSummary>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    let config = options.config();
    let tracker = VisitedTracker::open(&config.visited_log).await;
    let fetcher = HttpFetcher::new(&config)?;
    let crawler = Arc::new(Crawler::new(ctx, fetcher, tracker, config)?);

    let summary = crawler.crawl(seeds).await;
    println!(
        "Crawl finished: {} indexed, {} without content, {} failed, {} skipped",
        summary.indexed, summary.empty, summary.failed, summary.skipped
    );
    Ok(summary)
}

async fn ask_command<C, E>(
    ctx: &RagContext<C, E, Database>,
    settings: &Settings,
    args: AskArgs,
) -> Result<()>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    let answerer = Answerer::new(ctx, answer_config(settings, args.top_k));
    let answer = answerer.answer(&args.question, &args.session).await?;
    println!("{}", answer);
    Ok(())
}

async fn serve_command<C, E>(
    ctx: RagContext<C, E, Database>,
    settings: &Settings,
    args: ServeArgs,
) -> Result<()>
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
{
    if !args.seeds.is_empty() {
        if args.crawl_first {
            crawl_command(&ctx, args.seeds, &args.options).await?;
        } else {
            let crawl_ctx = ctx.clone();
            let seeds = args.seeds;
            let options = args.options;
            tokio::spawn(async move {
                if let Err(e) = crawl_command(&crawl_ctx, seeds, &options).await {
                    error!("Background crawl failed: {}", e);
                }
            });
        }
    }

    let answerer = Arc::new(Answerer::new(&ctx, answer_config(settings, args.top_k)));
    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!("Listening on {}", settings.bind_addr);
    axum::serve(listener, create_router(answerer)).await?;
    Ok(())
}
