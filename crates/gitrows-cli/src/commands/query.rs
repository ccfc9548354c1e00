//! Query command implementation

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use gitrows_core::{Filter, Row};
use gitrows_db::{IndexDb, IndexStore};
use gitrows_index::{
    collect_rows, CommitFilesTable, FilterIter, IndexLookup, IndexLookupable, LimitIter,
    RepositoryPool, RowIter, ScanOptions, Scannable,
};
use rayon::prelude::*;
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Color, Modify, Style},
    Table,
};

use crate::helpers::parse_filter;
use crate::output::AssociationRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

pub struct QueryArgs {
    pub filter: Option<String>,
    pub use_index: bool,
    pub limit: Option<usize>,
    pub format: OutputFormat,
    pub all_commits: bool,
    pub threads: Option<usize>,
}

/// Scans every partition in parallel and returns rows in partition order
fn run<T>(table: &T, post_filter: Option<&Filter>, limit: Option<usize>) -> Result<Vec<Row>>
where
    T: Scannable + Sync,
    T::Iter: 'static,
{
    let partitions = table.partitions();
    let per_partition = partitions
        .par_iter()
        .map(|partition| -> Result<Vec<Row>> {
            let mut iter: Box<dyn RowIter + Send> = Box::new(
                table
                    .scan(partition)
                    .with_context(|| format!("Failed to scan partition '{}'", partition))?,
            );
            if let Some(filter) = post_filter {
                iter = Box::new(FilterIter::new(iter, filter.clone()));
            }
            if let Some(n) = limit {
                iter = Box::new(LimitIter::new(iter, n));
            }
            let rows = collect_rows(iter)
                .with_context(|| format!("Failed to read partition '{}'", partition))?;
            log::debug!("Partition '{}': {} rows", partition, rows.len());
            Ok(rows)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows: Vec<Row> = per_partition.into_iter().flatten().collect();
    if let Some(n) = limit {
        rows.truncate(n);
    }
    Ok(rows)
}

/// Runs a query over the commit-files table
pub fn cmd_query(args: QueryArgs, pool: RepositoryPool, db: IndexDb) -> Result<()> {
    if pool.is_empty() {
        anyhow::bail!("No repositories given (use --repos or --repo)");
    }
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let filter = args.filter.as_deref().map(parse_filter).transpose()?;
    if let Some(f) = &filter {
        log::info!("Filter: {}", f);
    }

    let table = CommitFilesTable::new(
        Arc::new(pool),
        ScanOptions {
            all_commits: args.all_commits,
        },
    );

    let rows = if args.use_index {
        if db.is_empty() {
            log::warn!("Index is empty, run `gitrows index` first");
        }
        let store: Arc<dyn IndexStore> = Arc::new(db);
        let lookup = match filter {
            Some(f) => IndexLookup::matching(store, f).context("Invalid index lookup")?,
            None => IndexLookup::all(store),
        };
        run(&table.with_index_lookup(lookup), None, args.limit)?
    } else {
        run(&table, filter.as_ref(), args.limit)?
    };

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{} No rows match", "❌".red());
                return Ok(());
            }
            let display: Vec<AssociationRow> = rows.iter().map(AssociationRow::from).collect();
            let mut out = Table::new(display);
            out.with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Color::FG_BRIGHT_CYAN));
            println!("{}", out);
            println!("\n  {} rows", rows.len().to_string().bold());
        }
    }
    Ok(())
}
