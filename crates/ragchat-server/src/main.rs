use anyhow::Result;
use clap::Parser;
use ragchat_core::Settings;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragchat-server")]
#[command(author, version, about = "RagChat HTTP API Server", long_about = None)]
struct Cli {
    /// Database path (defaults to RAGCHAT_DATABASE or .ragchat/index.db)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ragchat_server=debug,ragchat_core=debug,ragchat_crawler=debug,ragchat_models=debug,tower_http=debug"
    } else {
        "ragchat_server=info,ragchat_core=info,ragchat_crawler=info,ragchat_models=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::from_env()?;
    if let Some(database) = cli.database {
        settings.database = database;
    }

    ragchat_server::start(settings, SocketAddr::new(cli.host, cli.port)).await
}
