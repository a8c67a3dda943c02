//! Crawl command implementation.

use anyhow::Result;
use colored::Colorize;
use ragchat_core::service::RagService;
use ragchat_core::Settings;
use ragchat_server::DefaultRagService;

/// Run the crawl command.
pub async fn run(settings: &Settings, url: Option<String>, max_pages: Option<usize>) -> Result<()> {
    let url = url.unwrap_or_else(|| settings.target_url.clone());
    let max_pages = max_pages.unwrap_or(settings.max_pages);

    println!(
        "{} Crawling {} (up to {} pages)",
        "→".blue(),
        url.yellow(),
        max_pages
    );

    let service = DefaultRagService::from_settings(settings)?;
    let report = service.crawl(&url, max_pages).await?;

    println!();
    println!(
        "{} Processed {} pages",
        "✓".green(),
        report.pages_processed.to_string().green()
    );
    println!("  Chunks in database: {}", report.chunks_total);
    println!("  Database: {}", settings.database.display());

    Ok(())
}
