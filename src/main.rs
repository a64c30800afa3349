//! CLI entry point for the gallery tool.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use clap::Parser;
use gallery_core::collection::ListingQuery;
use gallery_core::config::{self, GalleryConfig};
use gallery_core::query::QueryCriteria;
use gallery_core::Gallery;
use serde::Serialize;
use tracing::{debug, info};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = load_config(&args)?;
    let gallery = Gallery::new(config).context("failed to set up collection client")?;

    match args.command {
        Command::Search {
            term,
            department,
            era,
            page,
        } => {
            let criteria = QueryCriteria::new(term)
                .department(department)
                .era(era)
                .page(usize::try_from(page).unwrap_or(usize::MAX));
            let page = gallery.search(&criteria).await?;
            print_json(&page)?;
        }
        Command::Random { count, query } => {
            let count = count
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(gallery.config().sample_size);
            let pool = match query {
                Some(term) => ListingQuery::search(term, None),
                None => ListingQuery::Catalog,
            };
            let records = gallery.sample(&pool, count).await?;
            print_json(&records)?;
        }
        Command::Object { id } => match gallery.lookup(id).await? {
            Some(record) => print_json(&record)?,
            None => bail!("object {id} has no image"),
        },
        Command::Departments => {
            print_json(&gallery.departments().await)?;
        }
        Command::Featured => {
            print_json(&gallery.featured().await)?;
        }
    }

    let stats = gallery.cache_stats();
    info!(
        entries = stats.entries,
        hits = stats.hits,
        misses = stats.misses,
        "done"
    );

    Ok(())
}

/// File config (explicit path or default location) with CLI overrides applied.
fn load_config(args: &Args) -> Result<GalleryConfig> {
    let mut config = match &args.config {
        Some(path) => config::load(path)?,
        None => config::load_default()?,
    };

    if let Some(base_url) = &args.base_url {
        config.base_url.clone_from(base_url);
    }
    if let Some(pacing_ms) = args.pacing_ms {
        config.pacing_ms = pacing_ms;
    }
    config.validate()?;

    debug!(?config, "effective configuration");
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
