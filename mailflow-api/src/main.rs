//! Binary for the mailflow service: send orchestration, event webhook and
//! metrics over one SQLite-backed store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mailflow_api::{run_server, AppConfig};

#[derive(Parser)]
#[command(name = "mailflow", about = "Transactional email service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Run {
        /// Listen address, overrides LISTEN_ADDR.
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { listen } => {
            let config = AppConfig::load(listen)?;
            run_server(config).await
        }
    }
}
