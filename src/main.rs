use anyhow::Result;
use clap::Parser;
use job_board::admin_cli::{handle_admin_command, AdminCommand, Cli};
use job_board::app_log;
use job_board::core::{logging, ConfigManager};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigManager::load_from(path)?,
        None => ConfigManager::load()?,
    };

    logging::init(&config.logging)?;
    for warning in &config.startup_warnings {
        app_log!(warn, "{}", warning);
    }
    config.ensure_directories().await?;

    app_log!(info, "Environment: {}", config.environment);

    handle_admin_command(cli.command.unwrap_or(AdminCommand::Serve), config).await
}
