use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    serde::de::DeserializeOwned,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::CrosslinkConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "crosslink.toml",
    "crosslink.yaml",
    "crosslink.yml",
    "crosslink.json",
];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);
static DATA_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Use `dir` instead of the user-global config directory.
pub fn set_config_dir(dir: PathBuf) {
    *CONFIG_DIR_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()) = Some(dir);
}

/// Use `dir` instead of the platform data directory.
pub fn set_data_dir(dir: PathBuf) {
    *DATA_DIR_OVERRIDE.lock().unwrap_or_else(|e| e.into_inner()) = Some(dir);
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<CrosslinkConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./crosslink.{toml,yaml,yml,json}` (project-local)
/// 2. `<config_dir>/crosslink.{toml,yaml,yml,json}` (user-global)
///
/// Returns `CrosslinkConfig::default()` if no config file is found or the
/// file cannot be parsed.
pub fn discover_and_load() -> CrosslinkConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    CrosslinkConfig::default()
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/crosslink/`).
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
    {
        return Some(dir);
    }
    directories::ProjectDirs::from("", "", "crosslink").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the default SQLite database.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = DATA_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
    {
        return dir;
    }
    directories::ProjectDirs::from("", "", "crosslink")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The database URL to connect to: the configured one, or a file in [`data_dir`].
pub fn database_url(config: &CrosslinkConfig) -> String {
    if !config.database.url.trim().is_empty() {
        return config.database.url.clone();
    }
    format!(
        "sqlite://{}?mode=rwc",
        data_dir().join("crosslink.db").display()
    )
}

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Format implied by the file extension; no extension means TOML.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()).unwrap_or("toml") {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            ext => anyhow::bail!("unsupported config format: .{ext}"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }

    pub fn parse<T: DeserializeOwned>(self, raw: &str) -> anyhow::Result<T> {
        Ok(match self {
            Self::Toml => toml::from_str(raw)?,
            Self::Yaml => serde_yaml::from_str(raw)?,
            Self::Json => serde_json::from_str(raw)?,
        })
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<CrosslinkConfig> {
    ConfigFormat::from_path(path)?.parse(raw)
}
