use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dm_config::Config;

use crate::cli::Cli;

const DEFAULT_CONFIG_FILE: &str = "deutschmaster.json";

/// Load a config file
fn load_file(path: &Path) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Resolve the effective config: file (explicit or ./deutschmaster.json),
/// then environment, then command-line flags. Also returns the file used.
pub fn load_config(cli: &Cli) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let file = cli.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    });

    let config = match &file {
        Some(path) => load_file(path)?.with_env(),
        None => Config::new(),
    };

    let config = apply_cli(config, cli);
    config.validate().context("Invalid configuration")?;
    Ok((config, file))
}

fn apply_cli(mut config: Config, cli: &Cli) -> Config {
    if let Some(base) = &cli.base {
        config.data.base = base.clone();
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    if cli.log_json {
        config.log.json = true;
    }
    config
}
