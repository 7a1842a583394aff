use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Credentials for the hosted watering store.
///
/// Read from `SUPABASE_URL` and `SUPABASE_ANON_KEY`. Both unset or empty
/// means the store is unconfigured, which is a supported deployment:
/// schedule features degrade instead of failing.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
}

impl StoreConfig {
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok()?.trim().to_string();
        let key = std::env::var("SUPABASE_ANON_KEY").ok()?.trim().to_string();
        if url.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            key,
        })
    }
}

pub struct Config {
    pub settings_path: PathBuf,
    pub store: Option<StoreConfig>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "frond").context("Could not determine home directory")?;

        let config_dir = proj_dirs.config_dir().to_path_buf();
        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;

        Ok(Config {
            settings_path: config_dir.join("settings.json"),
            store: StoreConfig::from_env(),
        })
    }
}

/// Catalog CSV path used when `--catalog` is not given: the
/// `FROND_CATALOG` environment variable, else `plants.csv`.
pub fn default_catalog_path() -> PathBuf {
    match std::env::var("FROND_CATALOG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from("plants.csv"),
    }
}
