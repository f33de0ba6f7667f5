use std::path::PathBuf;

use clap::Parser;
use dm_types::Locale;

#[derive(Parser, Debug, Default)]
#[command(
    name = "deutschmaster",
    version,
    about = "Loads DeutschMaster learning content for a locale"
)]
pub struct Cli {
    /// JSON config file (defaults to ./deutschmaster.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Content root: http(s) URL or local directory
    #[arg(long)]
    pub base: Option<String>,

    /// Locale to load first (it, en, de)
    #[arg(long)]
    pub locale: Option<Locale>,

    /// Load once, print the result and exit
    #[arg(long)]
    pub once: bool,

    /// Print snapshots as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}
