use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "callsignal")]
#[command(about = "CallSignal - simulated earnings-call narrative feed and scoring", long_about = None)]
struct Cli {
    /// Directory holding config.toml, secret.json and stored data
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a simulated call with live narrative scoring
    Simulate(commands::simulate::SimulateArgs),
    /// Waitlist sign-ups
    Waitlist {
        #[command(subcommand)]
        action: WaitlistAction,
    },
    /// Configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum WaitlistAction {
    /// Join the waitlist
    Join(commands::waitlist::JoinArgs),
    /// List stored sign-ups
    List {
        /// Waitlist file (defaults to waitlist.toml in the config directory)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Create secret.json from a template if it does not exist
    InitSecret,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = callsignal_infrastructure::CallSignalPaths::new(cli.config_dir.as_deref());

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(&paths, args).await?,
        Commands::Waitlist { action } => match action {
            WaitlistAction::Join(args) => commands::waitlist::join(&paths, args).await?,
            WaitlistAction::List { store } => commands::waitlist::list(&paths, store).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&paths)?,
            ConfigAction::InitSecret => commands::config::init_secret(&paths)?,
        },
    }

    Ok(())
}
