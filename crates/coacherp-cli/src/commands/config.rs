//! Config command handlers

use anyhow::{bail, Result};
use std::path::PathBuf;

use coacherp_core::Config;

use crate::output::Output;
use crate::ConfigCommands;

/// Dispatch a config subcommand
pub fn handle(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => show(output),
        Some(ConfigCommands::Set { key, value }) => set(key, value, output),
    }
}

/// Show the current configuration
fn show(output: &Output) -> Result<()> {
    let config = Config::load()?;

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "config_file": Config::config_file_path(),
                "data_dir": config.data_dir,
                "file_name": config.file_name,
                "client_id": config.client_id,
                "access_token_configured": config.access_token.is_some(),
            })
        );
    } else {
        println!("Config file: {}", Config::config_file_path().display());
        println!("data_dir     = {}", config.data_dir.display());
        println!("file_name    = {}", config.file_name);
        println!(
            "client_id    = {}",
            config.client_id.as_deref().unwrap_or("(not set)")
        );
        println!(
            "access_token = {}",
            if config.access_token.is_some() {
                "(configured)"
            } else {
                "(not set)"
            }
        );
    }

    Ok(())
}

/// Set a configuration value
fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load()?;

    match key.as_str() {
        "data_dir" => config.data_dir = PathBuf::from(&value),
        "file_name" => config.file_name = value.clone(),
        "client_id" => {
            config.client_id = if value.is_empty() { None } else { Some(value.clone()) }
        }
        "access_token" => {
            config.access_token = if value.is_empty() { None } else { Some(value.clone()) }
        }
        other => bail!(
            "Unknown config key '{}'. Valid keys: data_dir, file_name, client_id, access_token",
            other
        ),
    }

    config.save()?;
    output.success(&format!("Set {}", key));
    Ok(())
}
