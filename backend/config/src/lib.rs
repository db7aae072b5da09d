//! `fiberlens-config` — runtime configuration for fiberlens.
//!
//! Provides:
//! - Typed config schema (browser endpoint, resolver heuristics, fetching, logging)
//! - YAML loading with `${ENV_VAR}` substitution
//! - `FIBERLENS_*` environment overrides
//! - Schema validation

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{
    apply_env_overrides, apply_env_overrides_with, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config, load_with_overrides, parse_config};
pub use schema::{BrowserConfig, FetchConfig, FiberlensConfig, LoggingConfig, ResolverConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport, MAX_DISCOVERY_WINDOW_MS};

use anyhow::{bail, Result};
use std::path::Path;

/// Load the config, apply env overrides, and validate it.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: Option<&Path>) -> Result<FiberlensConfig> {
    let config = load_with_overrides(path).await?;
    ensure_valid(&config)?;
    Ok(config)
}

/// Log validation warnings and fail on the first error.
pub fn ensure_valid(config: &FiberlensConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{first} ({} error(s) total)", report.errors.len());
    }
    Ok(())
}
