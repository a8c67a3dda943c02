//! Stats command implementation.

use anyhow::Result;
use colored::Colorize;
use ragchat_core::storage::{SqliteStorage, StatsStore};
use ragchat_core::Settings;

/// Run the stats command.
pub async fn run(settings: &Settings) -> Result<()> {
    if !super::database_exists(settings) {
        return Ok(());
    }

    println!("{} Database Statistics", "→".blue());
    println!();

    let storage = SqliteStorage::new(&settings.database)?;
    let stats = storage.stats().await?;

    let file_size = std::fs::metadata(&settings.database)?.len();
    let size_mb = file_size as f64 / (1024.0 * 1024.0);

    println!("  Database: {}", settings.database.display());
    println!("  Database size: {:.2} MB", size_mb);
    super::print_stats(stats.as_ref());

    Ok(())
}
