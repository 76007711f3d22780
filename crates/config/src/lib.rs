//! Configuration loading, validation, and env substitution.
//!
//! Config files: `whatsend.toml`, `whatsend.yaml`, or `whatsend.json`
//! Searched in `./` then `~/.config/whatsend/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        config_dir, discover_and_load, find_config_file, find_or_default_config_path, load_config,
        save_config, set_config_dir, update_config,
    },
    schema::{
        BrowserConfig, SelectorsConfig, ServerConfig, TimeoutsConfig, UiConfig, WhatsAppConfig,
        WhatsendConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
