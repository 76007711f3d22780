use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::WhatsendConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "whatsend.toml",
    "whatsend.yaml",
    "whatsend.yml",
    "whatsend.json",
];

static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Use `dir` instead of the standard locations for config discovery.
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = Some(dir);
    }
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE.read().ok().and_then(|g| g.clone())
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<WhatsendConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. the directory given to [`set_config_dir`], exclusively, when set
/// 2. `./whatsend.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/whatsend/whatsend.{toml,yaml,yml,json}` (user-global)
///
/// Returns `WhatsendConfig::default()` if no config file is found.
pub fn discover_and_load() -> WhatsendConfig {
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
    WhatsendConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return find_in(&dir);
    }

    find_in(Path::new(".")).or_else(|| config_dir().and_then(|dir| find_in(&dir)))
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: the override if set, else the user-global
/// one (`~/.config/whatsend/`).
pub fn config_dir() -> Option<PathBuf> {
    config_dir_override().or_else(|| {
        directories::ProjectDirs::from("", "", "whatsend").map(|d| d.config_dir().to_path_buf())
    })
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("whatsend.toml")
}

/// Write `config` to the config path, in that file's format.
///
/// Creates parent directories if needed. Returns the path written to.
pub fn save_config(config: &WhatsendConfig) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

fn save_config_to(config: &WhatsendConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serialize_config(config, path)?;
    std::fs::write(path, contents)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Load the config file as written, apply `f`, and save it back.
///
/// `${ENV}` placeholders are not expanded, so they survive the rewrite.
/// Nothing is written when the file does not parse or `f` fails.
pub fn update_config(
    f: impl FnOnce(&mut WhatsendConfig) -> anyhow::Result<()>,
) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    update_config_at(&path, f)?;
    Ok(path)
}

fn update_config_at(
    path: &Path,
    f: impl FnOnce(&mut WhatsendConfig) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        parse_config(&raw, path)
            .map_err(|e| anyhow::anyhow!("cannot edit {}: {e}", path.display()))?
    } else {
        WhatsendConfig::default()
    };
    f(&mut config)?;
    save_config_to(&config, path)
}

fn serialize_config(config: &WhatsendConfig, path: &Path) -> anyhow::Result<String> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))
        },
        "yaml" | "yml" => Ok(serde_yaml::to_string(config)?),
        "json" => Ok(serde_json::to_string_pretty(config)? + "\n"),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<WhatsendConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
