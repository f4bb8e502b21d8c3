//! Configuration loading, validation and env substitution.
//!
//! Config files: `crosslink.toml`, `crosslink.yaml` or `crosslink.json`,
//! searched in `./` then `~/.config/crosslink/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        ConfigFormat, config_dir, data_dir, database_url, discover_and_load, load_config, set_config_dir,
        set_data_dir,
    },
    schema::{
        CrosslinkConfig, DEFAULT_REPLY_TIMEOUT_MS, DatabaseConfig, DirectMessageMode,
        ForwardConfig, ForwardMode, ForwardRule,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
