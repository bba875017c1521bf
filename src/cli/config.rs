use anyhow::{bail, Context, Result};
use eating_meeting::config::AppConfig;
use eating_meeting::storage::path_utils;

fn read_config_value() -> Result<serde_json::Value> {
    let config_path = path_utils::config_path();
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        serde_json::from_str(&content).with_context(|| "Invalid JSON in config.json")
    } else {
        Ok(serde_json::to_value(AppConfig::default())?)
    }
}

/// `config show`: the effective file (or defaults). The API key is masked.
pub fn run_show() -> Result<()> {
    let mut config = read_config_value()?;
    if let Some(key) = config.pointer_mut("/places/api_key") {
        if key.as_str().is_some_and(|k| !k.is_empty()) {
            *key = serde_json::Value::String("********".into());
        }
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// `config get <key>`, e.g. `places.page_size`.
pub fn run_get(key: &str) -> Result<()> {
    let config = read_config_value()?;
    match resolve_path(&config, key) {
        Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
        None => bail!("Key not found: {}", key),
    }
    Ok(())
}

/// `config set <key> <value>`. The value is parsed as JSON, falling back to
/// a string. The result must still deserialize as a config.
pub fn run_set(key: &str, value: &str) -> Result<()> {
    let config_path = path_utils::config_path();
    let mut config: serde_json::Value = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_json::from_str(&content).unwrap_or(serde_json::json!({}))
    } else {
        serde_json::to_value(AppConfig::default())?
    };

    let parsed: serde_json::Value = serde_json::from_str(value)
        .unwrap_or(serde_json::Value::String(value.to_string()));
    set_path(&mut config, key, parsed.clone())?;

    serde_json::from_value::<AppConfig>(config.clone())
        .with_context(|| format!("{} = {} does not fit the config schema", key, value))?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("{} = {}", key, serde_json::to_string(&parsed)?);
    Ok(())
}

/// Resolve a dot-separated path in a JSON value.
fn resolve_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Set a value at a dot-separated path, creating intermediate objects as needed.
fn set_path(root: &mut serde_json::Value, path: &str, value: serde_json::Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        bail!("Empty key path");
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = serde_json::json!({});
        }
        let Some(obj) = current.as_object_mut() else {
            bail!("Cannot descend into {}", segment);
        };
        current = obj
            .entry(segment.to_string())
            .or_insert_with(|| serde_json::json!({}));
    }

    if !current.is_object() {
        *current = serde_json::json!({});
    }
    let Some(obj) = current.as_object_mut() else {
        bail!("Cannot set {}", path);
    };
    obj.insert(last.to_string(), value);
    Ok(())
}
