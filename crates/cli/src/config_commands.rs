use {
    anyhow::{Context, Result, bail},
    clap::Subcommand,
    serde_json::Value,
    whatsend_config::WhatsendConfig,
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective config, or one dotted key (e.g. `whatsapp.timeouts.qr_scan_ms`).
    Get { key: Option<String> },
    /// Set a dotted key and save the config file.
    Set { key: String, value: String },
    /// Print the config file path.
    Path,
}

pub fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key: None } => {
            let config = whatsend_config::discover_and_load();
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
        ConfigAction::Get { key: Some(key) } => {
            let config = whatsend_config::discover_and_load();
            let value = get_key(&config, &key)?;
            match value {
                Value::String(s) => println!("{s}"),
                other => println!("{other}"),
            }
            Ok(())
        },
        ConfigAction::Set { key, value } => {
            let path = whatsend_config::update_config(|config| {
                *config = set_key(config, &key, &value)?;
                Ok(())
            })?;
            eprintln!("Saved {key} to {}", path.display());
            Ok(())
        },
        ConfigAction::Path => {
            println!("{}", whatsend_config::find_or_default_config_path().display());
            Ok(())
        },
    }
}

fn get_key(config: &WhatsendConfig, key: &str) -> Result<Value> {
    let root = serde_json::to_value(config)?;
    key.split('.')
        .try_fold(&root, |node, part| node.get(part))
        .cloned()
        .with_context(|| format!("unknown config key '{key}'"))
}

/// `raw` is read as JSON when it parses (numbers, booleans), else as a string.
fn set_key(config: &WhatsendConfig, key: &str, raw: &str) -> Result<WhatsendConfig> {
    let mut root = serde_json::to_value(config)?;
    let mut node = &mut root;
    for part in key.split('.') {
        node = node
            .get_mut(part)
            .with_context(|| format!("unknown config key '{key}'"))?;
    }
    if node.is_object() {
        bail!("'{key}' is a section, set one of its keys instead");
    }

    if let Ok(typed) = serde_json::from_str::<Value>(raw) {
        *node = typed;
        if let Ok(config) = serde_json::from_value(root.clone()) {
            return Ok(config);
        }
    }
    // Fall back to the literal text, e.g. a contact name that looks numeric.
    let mut node = &mut root;
    for part in key.split('.') {
        node = node
            .get_mut(part)
            .with_context(|| format!("unknown config key '{key}'"))?;
    }
    *node = Value::String(raw.to_string());
    serde_json::from_value(root).with_context(|| format!("invalid value for '{key}': {raw}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn get_nested_key() {
        let config = WhatsendConfig::default();
        assert_eq!(
            get_key(&config, "whatsapp.timeouts.qr_scan_ms").unwrap(),
            serde_json::json!(120_000)
        );
        assert!(get_key(&config, "whatsapp.nope").is_err());
    }

    #[test]
    fn set_number_and_string() {
        let config = WhatsendConfig::default();
        let config = set_key(&config, "server.port", "9000").unwrap();
        assert_eq!(config.server.port, 9000);

        let config = set_key(&config, "ui.default_contact", "Guilherme").unwrap();
        assert_eq!(config.ui.default_contact, "Guilherme");
    }

    #[test]
    fn numeric_text_stays_a_string() {
        let config = set_key(&WhatsendConfig::default(), "ui.default_contact", "12345").unwrap();
        assert_eq!(config.ui.default_contact, "12345");
    }

    #[test]
    fn set_rejects_bad_values_and_sections() {
        let config = WhatsendConfig::default();
        assert!(set_key(&config, "server.port", "not-a-port").is_err());
        assert!(set_key(&config, "whatsapp.selectors", "x").is_err());
    }
}
