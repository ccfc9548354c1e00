//! Index command implementation

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use gitrows_db::IndexDb;
use gitrows_index::formatting::format_number;
use gitrows_index::{BuildOptions, IndexBuilder, RepositoryPool, ResolutionPolicy};
use std::path::PathBuf;

/// Command-line overrides for the build configuration
pub struct IndexArgs {
    pub config: Option<PathBuf>,
    pub rebuild: bool,
    pub all_commits: bool,
    pub skip_unresolved: bool,
    pub progress_interval: Option<usize>,
}

/// Builds the commit-files index for every repository of the pool
pub fn cmd_index(args: IndexArgs, pool: RepositoryPool, db: IndexDb) -> Result<()> {
    if pool.is_empty() {
        anyhow::bail!("No repositories given (use --repos or --repo)");
    }

    let mut options = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {:?}", path))?;
            serde_json::from_str::<BuildOptions>(&text)
                .with_context(|| format!("Invalid build config {:?}", path))?
        }
        None => BuildOptions::default(),
    };
    if args.all_commits {
        options.all_commits = true;
    }
    if args.skip_unresolved {
        options.on_unresolved = ResolutionPolicy::Skip;
    }
    if let Some(interval) = args.progress_interval {
        options.progress_interval = interval;
    }

    if args.rebuild {
        log::info!("Clearing {} existing associations", format_number(db.entry_count()));
        db.clear().context("Failed to clear index")?;
    }

    log::info!("Starting index build for {} repositories", pool.len());
    log::debug!("Build options: {:?}", options);

    let stats = IndexBuilder::new(&pool, &db, options)
        .build()
        .context("Failed to build index")?;

    db.set_built_at(Utc::now().timestamp() as u64)?;

    println!("{} {}", "✅ Index built:".bright_green(), stats);
    if stats.duplicates > 0 {
        println!(
            "  {} {} associations were already indexed (use {} to start over)",
            "ℹ".bright_blue(),
            format_number(stats.duplicates).bold(),
            "--rebuild".bright_cyan()
        );
    }
    Ok(())
}
