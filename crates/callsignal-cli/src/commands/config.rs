use anyhow::{Context, Result};
use callsignal_infrastructure::{CallSignalPaths, ConfigService};
use colored::Colorize;

pub fn show(paths: &CallSignalPaths) -> Result<()> {
    let service = ConfigService::from_paths(paths)?;
    let config = service.get_config()?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;

    println!("{}", format!("# {}", service.path().display()).dimmed());
    println!("{rendered}");
    Ok(())
}

pub fn init_secret(paths: &CallSignalPaths) -> Result<()> {
    let path = paths.ensure_secret_file()?;
    println!("{}", format!("Secret file: {}", path.display()).green());
    println!("Add your Gemini API key there, or set GEMINI_API_KEY.");
    Ok(())
}
