use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_TRANSCRIPT_PATH: &str = "transcript.txt";
pub const DEFAULT_SUMMARY_PATH: &str = "summary.json";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_url: Option<String>,
    pub default_lang: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub bind: Option<String>,
    pub transcript_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub yt_dlp: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Resolve the API key: explicit flag, then environment, then config file.
    ///
    /// Blank values count as missing. `None` selects the local summarizer.
    pub fn api_key(&self, flag: Option<&str>) -> Option<String> {
        let env = std::env::var(API_KEY_ENV).ok();
        resolve_api_key(flag, env.as_deref(), self.gemini_api_key.as_deref())
    }
}

fn resolve_api_key(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> Option<String> {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(str::to_string)
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}
