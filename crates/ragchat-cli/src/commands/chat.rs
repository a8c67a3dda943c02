//! Interactive chat command.

use anyhow::Result;
use colored::Colorize;
use ragchat_core::service::RagService;
use ragchat_core::{ChatMessage, Settings};
use ragchat_server::DefaultRagService;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// What the user typed at the prompt.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Quit,
    Stats,
    Clear,
    Empty,
    Question(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/stats" => Input::Stats,
        "/clear" => Input::Clear,
        question => Input::Question(question),
    }
}

/// Append a question and its answer, keeping only the last `keep` messages.
fn remember(history: &mut Vec<ChatMessage>, question: &str, answer: &str, keep: usize) {
    history.push(ChatMessage::user(question));
    history.push(ChatMessage::assistant(answer));
    if history.len() > keep {
        history.drain(..history.len() - keep);
    }
}

/// Run the chat command.
pub async fn run(settings: &Settings) -> Result<()> {
    let service = DefaultRagService::from_settings(settings)?;

    println!("{}", "RagChat".bold());
    println!("Ask anything about {}.", settings.target_url.cyan());
    println!(
        "{}",
        "Commands: /stats shows the database, /clear forgets the conversation, /quit exits.".dimmed()
    );
    println!();

    let mut history: Vec<ChatMessage> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(format!("{} ", "You:".green().bold()).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Clear => {
                history.clear();
                println!("{} Conversation cleared.", "✓".green());
            }
            Input::Stats => {
                let stats = service.stats().await?;
                super::print_stats(stats.as_ref());
            }
            Input::Question(question) => {
                let answer = service.ask(question, &history).await?;
                println!();
                println!("{}", "Assistant:".blue().bold());
                super::print_answer(&answer);
                remember(&mut history, question, &answer.answer, settings.history_messages);
            }
        }
        println!();
    }

    println!("Goodbye!");
    Ok(())
}
