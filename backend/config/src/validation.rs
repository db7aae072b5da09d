//! Config validation with user-friendly error messages.

use crate::schema::FiberlensConfig;
use thiserror::Error;

/// Longest discovery window accepted, in milliseconds.
pub const MAX_DISCOVERY_WINDOW_MS: u64 = 30_000;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &FiberlensConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_browser(config, &mut report);
    validate_resolver(config, &mut report);
    validate_fetch(config, &mut report);
    report
}

fn validate_browser(config: &FiberlensConfig, report: &mut ValidationReport) {
    let endpoint = &config.browser.endpoint;
    match url::Url::parse(endpoint) {
        Ok(parsed) => {
            if !matches!(parsed.scheme(), "http" | "https" | "ws" | "wss") {
                report.error(
                    "browser.endpoint",
                    format!(
                        "Unsupported scheme '{}'. Use http, https, ws, or wss",
                        parsed.scheme()
                    ),
                );
            }
        }
        Err(e) => report.error("browser.endpoint", format!("'{endpoint}' is not a URL: {e}")),
    }
}

fn validate_resolver(config: &FiberlensConfig, report: &mut ValidationReport) {
    let resolver = &config.resolver;
    if resolver.discovery_window_ms > MAX_DISCOVERY_WINDOW_MS {
        report.error(
            "resolver.discoveryWindowMs",
            format!("discoveryWindowMs must be <= {MAX_DISCOVERY_WINDOW_MS}"),
        );
    } else if resolver.discovery_window_ms == 0 {
        report.warn(
            "resolver.discoveryWindowMs",
            "A zero discovery window leaves fuzzy matching without scripts",
        );
    }
    if resolver.script_extensions.is_empty() {
        report.error("resolver.scriptExtensions", "At least one script extension is required");
    }
    if resolver.source_extensions.is_empty() {
        report.error("resolver.sourceExtensions", "At least one source extension is required");
    }
    for (i, ext) in resolver.source_extensions.iter().enumerate() {
        if ext.starts_with('.') {
            report.warn(
                format!("resolver.sourceExtensions[{i}]"),
                format!("'{ext}' should be written without the leading dot"),
            );
        }
    }
}

fn validate_fetch(config: &FiberlensConfig, report: &mut ValidationReport) {
    if config.fetch.timeout_secs == 0 {
        report.error("fetch.timeoutSecs", "timeoutSecs must be > 0");
    }
}
