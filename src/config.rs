use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Optional settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "brf_scraper";
pub const ENV_PREFIX: &str = "BRF";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Directory export files are written into.
    pub out_dir: PathBuf,
    /// Upper bound on chatter posts per export.
    pub chatter_max: usize,
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            out_dir: PathBuf::from("exports"),
            chatter_max: 20,
            pretty: true,
        }
    }
}

impl Settings {
    /// Defaults, then `brf_scraper.toml` if present, then `BRF_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(File::with_name(CONFIG_FILE).required(false))
    }

    fn load_from(file: File<config::FileSourceFile, config::FileFormat>) -> Result<Self> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("out_dir", defaults.out_dir.to_string_lossy().to_string())?
            .set_default("chatter_max", defaults.chatter_max as i64)?
            .set_default("pretty", defaults.pretty)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load settings")?;
        settings
            .try_deserialize()
            .context("Failed to parse settings")
    }
}
