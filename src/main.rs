//! Reelcut CLI entry point.

use anyhow::Result;
use clap::Parser;
use reelcut::cli::{commands, Cli, Commands};
use reelcut::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging. stdout belongs to the MCP protocol, so logs go to stderr.
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("reelcut={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match &cli.command {
        Commands::Chat {
            video,
            model,
            in_process,
        } => {
            commands::run_chat(video, model.clone(), *in_process, settings).await?;
        }

        Commands::Edit {
            video,
            json,
            operation,
        } => {
            commands::run_edit(video, operation, *json, settings).await?;
        }

        Commands::Tools { json } => {
            commands::run_tools(*json)?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
