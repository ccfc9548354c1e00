//! Stats command implementation

use anyhow::Result;
use colored::Colorize;
use gitrows_db::{IndexDb, IndexStore};
use gitrows_index::formatting::{format_number, format_unix_timestamp};

/// Displays index statistics
pub fn cmd_stats(db: IndexDb) -> Result<()> {
    let counts = db.repository_counts()?;
    let built_at = db
        .built_at()?
        .map(format_unix_timestamp)
        .unwrap_or_else(|| "never".to_string());

    println!("{}", "Index Statistics:".bright_cyan().bold());
    println!("  {}: {}", "Associations".bright_yellow(), format_number(db.entry_count()).bold());
    println!("  {}: {}", "Repositories".bright_yellow(), counts.len().to_string().bold());
    println!("  {}: {}", "Envelope".bright_yellow(), db.envelope().name().bold());
    println!("  {}: {}", "Last build".bright_yellow(), built_at.bold());
    println!(
        "  {}: {} bytes",
        "Size on disk".bright_yellow(),
        format_number(db.size_on_disk()? as usize).bold()
    );

    for (repository, count) in &counts {
        println!("    {} {}", repository.bright_white(), format_number(*count).dimmed());
    }
    Ok(())
}
