use std::path::PathBuf;

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use directories::ProjectDirs;
use eyre::{Context, Result, eyre};
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_K: u8 = 3;
pub const MIN_K: u8 = 1;
pub const MAX_K: u8 = 8;

const CONFIG_FILE: &str = "config.toml";

/// Clamp a user-supplied result count into `[MIN_K, MAX_K]`.
pub fn clamp_k(k: i64) -> u8 {
    // The clamp guarantees the value fits
    k.clamp(i64::from(MIN_K), i64::from(MAX_K)) as u8
}

/// Strip trailing slashes so paths can be appended without doubling them.
pub fn normalize_api_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "librarian")
}

/// Directory holding `config.toml`. `LIBRARIAN_CONFIG_DIR` wins over the platform default.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LIBRARIAN_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".librarian"))
}

/// Directory for log files.
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".librarian"))
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Base URL of the backend, without a trailing slash
    pub api_base: String,
    /// Result count used when the UI starts
    pub default_k: i64,
}

impl Settings {
    /// Defaults, then the optional config file, then `LIBRARIAN_*` environment variables.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let config_file = config_dir().join(CONFIG_FILE);

        Ok(Config::builder()
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("default_k", i64::from(DEFAULT_K))?
            .add_source(File::from(config_file.as_path()).required(false))
            .add_source(Environment::with_prefix("LIBRARIAN")))
    }

    pub fn new() -> Result<Self> {
        Self::from_builder(Self::builder()?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .wrap_err("could not load settings")?
            .try_deserialize()
            .map_err(|e| eyre!("failed to deserialize settings: {e}"))?;

        Ok(settings.normalized())
    }

    /// Replace the configured base URL, e.g. from a command line flag.
    pub fn with_api_base(mut self, api_base: impl AsRef<str>) -> Self {
        self.api_base = normalize_api_base(api_base.as_ref());
        self
    }

    pub fn default_k(&self) -> u8 {
        clamp_k(self.default_k)
    }

    fn normalized(mut self) -> Self {
        self.api_base = normalize_api_base(&self.api_base);
        self.default_k = i64::from(clamp_k(self.default_k));
        self
    }
}
