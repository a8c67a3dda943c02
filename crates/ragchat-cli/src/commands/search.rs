//! Search command implementation.

use anyhow::Result;
use colored::Colorize;
use ragchat_core::service::{RagService, SearchOptions};
use ragchat_core::{SearchQuery, Settings};
use ragchat_server::DefaultRagService;

/// Run the search command.
pub async fn run(settings: &Settings, query_str: String, limit: usize, threshold: f32) -> Result<()> {
    if !super::database_exists(settings) {
        return Ok(());
    }

    let query = SearchQuery::parse(&query_str);
    println!("{} Searching for: {}", "→".blue(), query.raw_query.yellow());
    if let Some(ref source) = query.source {
        println!("  {} source: {}", "•".dimmed(), source.cyan());
    }
    if let Some(ref pattern) = query.url_pattern {
        println!("  {} url: {}", "•".dimmed(), pattern.cyan());
    }
    println!();

    let service = DefaultRagService::from_settings(settings)?;
    let results = service
        .search(&query_str, SearchOptions { limit, threshold })
        .await?;

    if results.is_empty() {
        println!("{} No results found.", "→".yellow());
        return Ok(());
    }

    println!("{} Found {} results:", "✓".green(), results.len());
    println!();

    for (i, result) in results.iter().enumerate() {
        let Some(chunk) = &result.chunk else {
            continue;
        };
        println!(
            "{} {}",
            format!("[{}]", i + 1).blue(),
            format!("score: {:.4}", result.similarity).green()
        );
        println!("    {} {}", "→".dimmed(), chunk.title.yellow());
        println!("    {} {}", "→".dimmed(), chunk.url.cyan());
        println!();
        for line in chunk.content.lines().filter(|l| !l.trim().is_empty()).take(3) {
            println!("    {}", super::preview(line, 120).dimmed());
        }
        println!();
    }

    Ok(())
}
