//! accessgate - Server-assisted content authorization CLI
//!
#![doc = "accessgate - Server-assisted content authorization CLI"]
#![doc = "Main entry point for the accessgate application."]

use anyhow::Result;

use accessgate::cli::{Cli, Commands};
use accessgate::commands;
use accessgate::config::Config;
use accessgate::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Initialize logging
    logging::init_logging(&config.logging)?;

    // Execute command
    match cli.command {
        Commands::Authorize {
            page,
            url,
            origin,
            vars,
            output,
        } => {
            tracing::info!("Starting authorization for {}", url);
            tracing::debug!("Loading page from: {}", page.display());
            if let Some(o) = origin.as_origin() {
                tracing::debug!("Using origin override: {:?}", o);
            }
            commands::authorize::run_authorize(
                config,
                page,
                url,
                origin.as_origin(),
                vars,
                output,
            )
            .await?;
            Ok(())
        }
        Commands::Pingback { page, url, vars } => {
            tracing::info!("Starting pingback for {}", url);
            commands::pingback::run_pingback(config, page, url, vars).await?;
            Ok(())
        }
        Commands::Inspect { page, url } => {
            tracing::info!("Inspecting page {}", page.display());
            commands::inspect::run_inspect(config, page, url)?;
            Ok(())
        }
    }
}
