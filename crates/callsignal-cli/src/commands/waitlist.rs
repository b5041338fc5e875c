use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use callsignal_application::{SignupOutcome, WaitlistService};
use callsignal_core::waitlist::{INDUSTRIES, WaitlistRepository, WaitlistSubmission};
use callsignal_infrastructure::{CallSignalPaths, TomlWaitlistRepository};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct JoinArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// One of the listed industries
    #[arg(long)]
    pub industry: String,
    /// Waitlist file (defaults to waitlist.toml in the config directory)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

fn repository(paths: &CallSignalPaths, store: Option<PathBuf>) -> Result<TomlWaitlistRepository> {
    Ok(match store {
        Some(path) => TomlWaitlistRepository::new(path),
        None => TomlWaitlistRepository::from_paths(paths)?,
    })
}

pub async fn join(paths: &CallSignalPaths, args: JoinArgs) -> Result<()> {
    let service = WaitlistService::new(Arc::new(repository(paths, args.store)?));
    let submission = WaitlistSubmission::new(args.name, args.email.clone(), args.industry);

    match service.join(submission).await {
        Ok(outcome) => {
            println!("{}", outcome.message().green().bold());
            if outcome != SignupOutcome::AlreadyJoined {
                println!("We'll reach out to {} when your spot opens up.", args.email.bold());
            }
            Ok(())
        }
        Err(e) if e.is_validation() => {
            eprintln!("{}", e.to_string().red());
            eprintln!("{}", format!("Industries: {}", INDUSTRIES.join(", ")).dimmed());
            anyhow::bail!("waitlist submission rejected")
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn list(paths: &CallSignalPaths, store: Option<PathBuf>) -> Result<()> {
    let entries = repository(paths, store)?.list().await?;
    if entries.is_empty() {
        println!("{}", "No sign-ups yet.".dimmed());
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:<24} {:<32} {}",
            entry.joined_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            entry.name,
            entry.email,
            entry.industry
        );
    }
    Ok(())
}
