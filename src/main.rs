//! Link-Digest main entry point
//!
//! This is the command-line interface for the Link-Digest report generator.

use anyhow::Context;
use clap::Parser;
use link_digest::config::{load_config_with_hash, validate, Config};
use link_digest::links::{load_links, LinkRules};
use link_digest::telemetry::{console_filter, RunLogs};
use link_digest::{Pipeline, RunOutcome};
use std::path::{Path, PathBuf};

/// Link-Digest: turn a list of links into clustered summaries
///
/// Link-Digest fetches every link in a links file, extracts readable text
/// from HTML and PDF responses, groups similar pages and writes a
/// keyword-annotated report for each clustering strategy.
#[derive(Parser, Debug)]
#[command(name = "link-digest")]
#[command(version)]
#[command(about = "Cluster and summarize a list of links", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the number of extraction workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Override the links file
    #[arg(long, value_name = "PATH")]
    links: Option<PathBuf>,

    /// Validate config and show what would be fetched without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(workers) = cli.workers {
        config.extraction.max_workers = workers;
    }
    if let Some(links) = &cli.links {
        config.links_file = links.display().to_string();
    }
    validate(&config).context("Invalid configuration")?;

    // Log files live for the whole run; dropping the guard restores the
    // previous (empty) default at shutdown
    let logs = RunLogs::open(
        Path::new(&config.output.log_dir),
        Some(console_filter(cli.verbose, cli.quiet)),
    )
    .with_context(|| format!("Failed to open log files in {}", config.output.log_dir))?;
    let _log_guard = logs.install();

    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("No configuration file given, using defaults"),
    }

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    handle_run(config).await
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Link-Digest Dry Run ===\n");

    println!("Extraction:");
    println!("  Links file: {}", config.links_file);
    println!("  Max workers: {}", config.extraction.max_workers);

    println!("\nEmbedding:");
    println!("  Model: {}", config.embedding.model);

    println!("\nClustering:");
    println!(
        "  Density: min cluster size {}, min samples {}",
        config.clustering.min_cluster_size, config.clustering.min_samples
    );
    println!(
        "  Hierarchical: distance threshold {}",
        config.clustering.distance_threshold
    );

    println!("\nOutput:");
    println!("  Density report: {}", config.output.hdbscan_report);
    println!("  Hierarchical report: {}", config.output.hierarchical_report);
    println!("  Log directory: {}", config.output.log_dir);
    if let Some(path) = &config.output.stats_json {
        println!("  Statistics JSON: {}", path);
    }

    let rules = LinkRules::from_config(config);
    println!("\nIgnore rules ({}):", rules.ignore.len());
    for pattern in &config.ignore_domains {
        println!("  - {}", pattern);
    }
    println!("\nRate-limit rules ({}):", rules.rate_limited.len());
    for pattern in &config.rate_limiting_domains {
        println!("  - {}", pattern);
    }

    let links = load_links(Path::new(&config.links_file))?;
    println!("\nLinks ({}):", links.len());
    let mut fetched = 0;
    for link in &links {
        let classification = rules.classify(link);
        if classification.should_fetch() {
            fetched += 1;
        }
        println!("  [{:?}] {}", classification, link);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} of {} links", fetched, links.len());

    Ok(())
}

/// Handles the main run
async fn handle_run(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Ignore rules: {}, Rate-limit rules: {}, Workers: {}",
        config.ignore_domains.len(),
        config.rate_limiting_domains.len(),
        config.extraction.max_workers
    );

    let pipeline = Pipeline::from_config(config)?;
    match pipeline.run().await {
        Ok(RunOutcome::NoInput) => {
            println!("No URLs found. Exiting.");
            Ok(())
        }
        Ok(RunOutcome::Completed(report)) => {
            for path in &report.reports {
                println!("✓ Report written to: {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}
