//! # serpsite CLI Application
//!
//! This module implements the command-line entry point: it loads settings and
//! keywords, runs the keyword pipeline for every keyword and prints a summary.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Console and file logging via tracing
//! - Progress bar fed by the coordinator's progress channel
//!
//! Failures are logged and summarized; the process always exits successfully.

mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serpsite::cache::ResultCache;
use serpsite::config::Settings;
use serpsite::keywords::load_keywords;
use serpsite::pipeline::{Coordinator, ExecutionMode, TaskResult};
use serpsite::search::SearchClient;
use serpsite::site::SiteEmitter;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate static keyword sites from search result pages", long_about = None)]
struct Cli {
    /// Poll keyword pipelines on the main task instead of spawning them
    #[arg(long = "async")]
    use_async: bool,

    /// Settings file, created with defaults when missing
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Keyword file, one keyword per line
    #[arg(short, long, default_value = "1.txt")]
    keywords: PathBuf,

    /// Output directory, overrides the settings file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for search.log
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = match telemetry::init_logging(&cli.log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:?}");
            None
        }
    };

    if let Err(e) = run(cli).await {
        error!("Run aborted: {:#}", e);
    }

    Ok(())
}

#[instrument(skip(cli))]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load_or_init(&cli.config).await;
    if let Some(output) = cli.output {
        settings.output_dir = output;
    }

    let keywords = load_keywords(&cli.keywords).await?;
    if keywords.is_empty() {
        warn!("No keywords found in {}", cli.keywords.display());
        println!("No keywords to process");
        return Ok(());
    }

    let mut client = SearchClient::from_settings(&settings)?;
    if settings.cache_enabled {
        match ResultCache::open(&settings.cache_dir).await {
            Ok(cache) => client = client.with_cache(Arc::new(cache)),
            Err(e) => warn!("Result cache disabled: {}", e),
        }
    }

    let mode = if cli.use_async {
        ExecutionMode::Inline
    } else {
        ExecutionMode::Pooled
    };
    let coordinator = Coordinator::new(
        Arc::new(client),
        Arc::new(SiteEmitter::from_settings(&settings)),
        &settings,
    )
    .with_mode(mode);

    info!(
        "Loaded {} keywords, writing to {}",
        keywords.len(),
        settings.output_dir.display()
    );

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel(100);

    let progress_bar = ProgressBar::new(keywords.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Generating sites...");

    let start_time = Instant::now();

    // Spawn a task to process progress updates
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(keyword) = progress_receiver.recv().await {
                progress_bar.inc(1);
                progress_bar.set_message(format!("Finished {}", keyword));
            }
            progress_bar.finish_with_message("Done");
        }
    });

    let results = coordinator.run(&keywords, Some(progress_sender)).await;

    // Wait for progress task to complete (it will end when all senders are dropped)
    let _ = progress_handle.await;

    print_summary(&results, start_time.elapsed());
    Ok(())
}

fn print_summary(results: &[TaskResult], elapsed: std::time::Duration) {
    let succeeded = results.iter().filter(|r| r.is_success()).count();

    println!();
    for result in results {
        println!("{}", result);
    }
    println!(
        "Processed {} keywords in {:.2?}: {} generated, {} failed",
        results.len(),
        elapsed,
        succeeded,
        results.len() - succeeded
    );
}
