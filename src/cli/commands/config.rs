//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the config command.
///
/// `explicit` is the `--config` path, which may not exist yet.
pub fn run_config(action: &ConfigAction, explicit: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = explicit
        .or_else(|| settings.source.clone())
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {} (use --force to overwrite)",
                    config_path.display()
                ));
                return Ok(());
            }
            settings.save_to(&config_path)?;
            Output::success(&format!("Wrote config to {}", config_path.display()));
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {}", config_path.display()));
            }
            open_in_editor(&config_path);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

fn open_in_editor(config_path: &Path) {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

    Output::info(&format!("Opening config in {}...", editor));

    let status = std::process::Command::new(&editor).arg(config_path).status();

    match status {
        Ok(s) if s.success() => {
            Output::success("Config saved.");
        }
        Ok(_) => {
            Output::warning("Editor exited with non-zero status.");
        }
        Err(e) => {
            Output::error(&format!("Failed to open editor: {}", e));
            Output::info(&format!("Config file is at: {}", config_path.display()));
        }
    }
}
