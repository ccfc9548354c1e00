//! gitrows CLI - commit-file associations of git repositories as rows
//!
//! Provides:
//! - Building an index of every (repository, commit, file) association
//! - Querying associations by walking history or through the index
//! - Inspecting the index and the partitions a query scans

mod commands;
mod helpers;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitrows_db::{Envelope, IndexDb, DEFAULT_LEVEL};
use std::path::PathBuf;

use commands::{cmd_index, cmd_partitions, cmd_query, cmd_stats, IndexArgs, OutputFormat, QueryArgs};
use helpers::build_pool;

#[derive(Parser)]
#[command(name = "gitrows")]
#[command(about = "Query which files every commit of your git repositories touched", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the index database
    #[arg(short, long, default_value = "./gitrows.db")]
    database: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Register every git repository directly under this directory
    #[arg(long)]
    repos: Option<PathBuf>,

    /// Register a repository as NAME=PATH (repeatable)
    #[arg(long = "repo", value_name = "NAME=PATH")]
    repo: Vec<String>,

    /// zstd level for values of a new index
    #[arg(long, conflicts_with = "no_compression")]
    compression_level: Option<i32>,

    /// Store values of a new index uncompressed
    #[arg(long)]
    no_compression: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Indexes every registered repository
    Index {
        /// JSON file with build options
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Remove existing associations before building
        #[arg(long)]
        rebuild: bool,

        /// Walk every reference, not only HEAD
        #[arg(short, long)]
        all_commits: bool,

        /// Leave out files whose objects cannot be located instead of failing
        #[arg(long)]
        skip_unresolved: bool,

        /// Commits between progress lines
        #[arg(long)]
        progress_interval: Option<usize>,
    },

    /// Lists commit-file associations
    Query {
        /// Predicate such as "commit_hash = 'abc...' OR file_path = 'README.md'"
        #[arg(short = 'w', long = "where")]
        filter: Option<String>,

        /// Read rows from the index instead of walking history
        #[arg(short = 'i', long)]
        use_index: bool,

        /// Maximum number of rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Walk every reference, not only HEAD
        #[arg(short, long)]
        all_commits: bool,

        /// Number of threads scanning partitions (default: number of CPU cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },

    /// Shows index statistics
    Stats,

    /// Lists the partitions a query scans
    Partitions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logger
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&cli.log_level)
    ).init();

    let envelope = if cli.no_compression {
        Envelope::Plain
    } else {
        Envelope::Zstd {
            level: cli.compression_level.unwrap_or(DEFAULT_LEVEL),
        }
    };

    // Open database
    let db = IndexDb::open(&cli.database, envelope)
        .with_context(|| format!("Failed to open database at {:?}", cli.database))?;

    match cli.command {
        Commands::Index { config, rebuild, all_commits, skip_unresolved, progress_interval } => {
            let pool = build_pool(cli.repos.as_deref(), &cli.repo)?;
            let args = IndexArgs { config, rebuild, all_commits, skip_unresolved, progress_interval };
            cmd_index(args, pool, db)?;
        }
        Commands::Query { filter, use_index, limit, format, all_commits, threads } => {
            let pool = build_pool(cli.repos.as_deref(), &cli.repo)?;
            let args = QueryArgs { filter, use_index, limit, format, all_commits, threads };
            cmd_query(args, pool, db)?;
        }
        Commands::Stats => {
            cmd_stats(db)?;
        }
        Commands::Partitions => {
            let pool = build_pool(cli.repos.as_deref(), &cli.repo)?;
            cmd_partitions(pool, db)?;
        }
    }

    Ok(())
}
