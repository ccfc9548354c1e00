//! Partitions command implementation

use anyhow::Result;
use colored::Colorize;
use gitrows_db::IndexDb;
use gitrows_index::formatting::format_number;
use gitrows_index::RepositoryPool;
use tabled::{settings::Style, Table};

use crate::output::PartitionRow;

/// Lists partitions in scan order with their indexed row counts
pub fn cmd_partitions(pool: RepositoryPool, db: IndexDb) -> Result<()> {
    if pool.is_empty() {
        println!("{} No repositories given (use --repos or --repo)", "❌".red());
        return Ok(());
    }

    let counts = db.repository_counts()?;
    let rows: Vec<PartitionRow> = pool
        .repositories()
        .map(|handle| PartitionRow {
            partition: handle.id().to_string(),
            path: handle.path().display().to_string(),
            indexed: counts
                .get(handle.id())
                .map(|n| format_number(*n))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}
