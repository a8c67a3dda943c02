//! Ask command implementation.

use anyhow::Result;
use colored::Colorize;
use ragchat_core::service::RagService;
use ragchat_core::Settings;
use ragchat_server::DefaultRagService;

/// Run the ask command.
pub async fn run(settings: &Settings, question: String) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        eprintln!("{} Question must not be empty.", "✗".red());
        return Ok(());
    }

    let service = DefaultRagService::from_settings(settings)?;
    let answer = service.ask(question, &[]).await?;

    super::print_answer(&answer);
    Ok(())
}
