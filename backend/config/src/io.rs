//! Config file loading.

use crate::env::{apply_env_overrides, resolve_env_vars};
use crate::schema::FiberlensConfig;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the fiberlens config directory.
/// Priority: `FIBERLENS_CONFIG_DIR` env > `<platform config dir>/fiberlens`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FIBERLENS_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::config_dir() {
        Some(base) => base.join("fiberlens"),
        None => PathBuf::from(".fiberlens"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk, substituting `${VAR}` references.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<FiberlensConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(FiberlensConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text into a config. Blank input yields the defaults.
pub fn parse_config(raw: &str) -> Result<FiberlensConfig> {
    if raw.trim().is_empty() {
        return Ok(FiberlensConfig::default());
    }
    let value: serde_json::Value = serde_yaml::from_str(raw)?;
    let value = resolve_env_vars(&value)?;
    Ok(serde_json::from_value(value)?)
}

/// Load from `path` (or the default location) and apply env overrides.
///
/// Only the default location may be missing; a path the user named must exist.
pub async fn load_with_overrides(path: Option<&Path>) -> Result<FiberlensConfig> {
    let path = match path {
        Some(p) if !p.exists() => bail!("Config file not found: {}", p.display()),
        Some(p) => p.to_path_buf(),
        None => config_file_path(&config_dir()),
    };
    let mut config = load_config(&path).await?;
    apply_env_overrides(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fiberlens-config-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let config = load_config(&scratch_file("absent.yaml")).await.unwrap();
        assert_eq!(config, FiberlensConfig::default());
    }

    #[tokio::test]
    async fn loads_yaml_from_disk() {
        let path = scratch_file("present.yaml");
        fs::write(&path, "browser:\n  endpoint: ws://127.0.0.1:9229/devtools/browser/abc\n")
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.browser.endpoint, "ws://127.0.0.1:9229/devtools/browser/abc");
        fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_yaml_names_the_file() {
        let path = scratch_file("broken.yaml");
        fs::write(&path, "resolver: [unclosed").await.unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
        fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn named_file_must_exist() {
        let path = scratch_file("typo.yaml");
        let err = load_with_overrides(Some(&path)).await.unwrap_err();
        assert!(err.to_string().contains("typo.yaml"));
    }

    #[tokio::test]
    async fn named_file_is_loaded() {
        let path = scratch_file("named.yaml");
        fs::write(&path, "fetch:\n  timeoutSecs: 3\n").await.unwrap();

        let config = load_with_overrides(Some(&path)).await.unwrap();
        assert_eq!(config.fetch.timeout_secs, 3);
        fs::remove_file(&path).await.unwrap();
    }

    #[test]
    fn blank_text_is_default() {
        assert_eq!(parse_config("  \n").unwrap(), FiberlensConfig::default());
    }

    #[test]
    fn file_name_is_config_yaml() {
        let path = config_file_path(Path::new("/etc/fiberlens"));
        assert_eq!(path, PathBuf::from("/etc/fiberlens/config.yaml"));
    }
}
