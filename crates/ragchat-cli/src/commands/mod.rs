pub mod ask;
pub mod chat;
pub mod crawl;
pub mod search;
pub mod stats;

use colored::Colorize;
use ragchat_core::storage::CorpusStats;
use ragchat_core::{Answer, Settings};

/// Characters of a source summary shown under an answer.
const SUMMARY_PREVIEW_CHARS: usize = 200;

/// Report a missing database; `true` if it exists.
pub fn database_exists(settings: &Settings) -> bool {
    if settings.database.exists() {
        return true;
    }
    eprintln!(
        "{} Database not found: {}",
        "✗".red(),
        settings.database.display()
    );
    eprintln!("Run 'ragchat crawl' first to create one.");
    false
}

pub fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);

    if answer.sources.is_empty() {
        return;
    }
    println!();
    println!("{}", "Sources:".bold());
    for (i, source) in answer.sources.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("[{}]", i + 1).blue(),
            source.title.yellow(),
            format!("({:.2})", source.score).dimmed()
        );
        println!("      {}", source.url.cyan());
        println!("      {}", preview(&source.summary, SUMMARY_PREVIEW_CHARS).dimmed());
    }
}

pub fn print_stats(stats: Option<&CorpusStats>) {
    let Some(stats) = stats else {
        println!("{} No documents stored yet.", "→".yellow());
        return;
    };

    println!("  Documents: {}", stats.doc_count.to_string().green());
    println!("  Domains: {}", stats.domains.join(", ").cyan());
    println!("  Pages: {}", stats.urls.len());
    println!("  Last updated: {}", stats.last_updated_local());
}

/// First `max_chars` characters of `text` on a single line.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
