mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "buddy")]
#[command(about = "A context-aware personal assistant agent", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the assistant
    Agent {
        /// Message to send (interactive mode if not provided)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show provider configuration status
    Status,

    /// Inspect registered capabilities
    Capabilities {
        /// Show the full schema for one capability
        #[arg(long)]
        describe: Option<String>,
    },

    /// Show how a piece of text would be routed, as JSON
    Route {
        /// The text to route
        text: String,
    },

    /// Run the specialist-communication demonstration
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Agent { message } => {
            commands::agent::run(message).await?;
        }
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Capabilities { describe } => {
            commands::capabilities::run(describe).await?;
        }
        Commands::Route { text } => {
            commands::route::run(&text).await?;
        }
        Commands::Demo => {
            commands::demo::run().await?;
        }
    }

    Ok(())
}
