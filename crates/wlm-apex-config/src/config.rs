// crates/wlm-apex-config/src/config.rs
// ============================================================================
// Module: WLM Apex Configuration
// Description: Configuration loading and validation for the apex reporter.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: wlm-apex-core, wlm-apex-source-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `WLM_APEX_CONFIG`, then
//! `wlm-apex.toml` in the working directory. Every section is optional and
//! defaults to the reporter's standard behavior.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use wlm_apex_core::ConcurrencyMode;
use wlm_apex_core::DEFAULT_GRANULARITY_SECONDS;
use wlm_apex_core::DEFAULT_MIN_SERVICE_CLASS;
use wlm_apex_core::DEFAULT_MIN_USER_ID;
use wlm_apex_core::DEFAULT_WINDOW_SECONDS;
use wlm_apex_core::ReportParams;
use wlm_apex_core::TiePolicy;
use wlm_apex_source_sqlite::DEFAULT_CONFIG_TABLE;
use wlm_apex_source_sqlite::DEFAULT_QUERY_TABLE;
use wlm_apex_source_sqlite::SqliteSourceConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "wlm-apex.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "WLM_APEX_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root configuration for the apex reporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WlmApexConfig {
    /// Report tunables.
    #[serde(default)]
    pub report: ReportConfig,
    /// Log source selection.
    #[serde(default)]
    pub source: Option<SourceConfig>,
    /// Lifecycle event logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WlmApexConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        Self::load_resolved(&resolved)
    }

    /// Loads configuration when one is configured or present, else defaults.
    ///
    /// An explicit path or `WLM_APEX_CONFIG` must point at a readable file;
    /// only the implicit `wlm-apex.toml` may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some() || env::var_os(CONFIG_ENV_VAR).is_some();
        let resolved = resolve_path(path)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        Self::load_resolved(&resolved)
    }

    /// Parses configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.report.validate()?;
        if let Some(source) = &self.source {
            source.validate()?;
        }
        self.logging.validate()?;
        Ok(())
    }

    /// Reads, bounds-checks, and parses a resolved config path.
    fn load_resolved(resolved: &Path) -> Result<Self, ConfigError> {
        validate_path(resolved)?;
        let bytes = fs::read(resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// `[report]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Lookback window in seconds.
    pub window_seconds: u64,
    /// Sampling step in seconds.
    pub granularity_seconds: u64,
    /// Exclusive lower bound for service classes.
    pub min_service_class: i64,
    /// Exclusive lower bound for user ids.
    pub min_user_id: i64,
    /// Tie reporting policy.
    pub tie_policy: TiePolicy,
    /// Concurrency resolution mode.
    pub concurrency_mode: ConcurrencyMode,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            granularity_seconds: DEFAULT_GRANULARITY_SECONDS,
            min_service_class: DEFAULT_MIN_SERVICE_CLASS,
            min_user_id: DEFAULT_MIN_USER_ID,
            tie_policy: TiePolicy::default(),
            concurrency_mode: ConcurrencyMode::default(),
        }
    }
}

impl ReportConfig {
    /// Converts the section into report params.
    #[must_use]
    pub const fn to_params(&self) -> ReportParams {
        ReportParams {
            window_seconds: self.window_seconds,
            granularity_seconds: self.granularity_seconds,
            min_service_class: self.min_service_class,
            min_user_id: self.min_user_id,
            tie_policy: self.tie_policy,
            concurrency_mode: self.concurrency_mode,
        }
    }

    /// Validates report tunables.
    fn validate(&self) -> Result<(), ConfigError> {
        self.to_params().validate().map_err(|err| ConfigError::Invalid(format!("report: {err}")))
    }
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Log source backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// `SQLite` copy of the host tables.
    #[default]
    Sqlite,
    /// JSON snapshot file.
    Snapshot,
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Source backend type.
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    /// Database or snapshot path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds (sqlite only).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Service class config table (sqlite only).
    #[serde(default)]
    pub config_table: Option<String>,
    /// Query execution log table (sqlite only).
    #[serde(default)]
    pub query_table: Option<String>,
}

impl SourceConfig {
    /// Returns the `SQLite` source settings when the backend is sqlite.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteSourceConfig> {
        if self.source_type != SourceType::Sqlite {
            return None;
        }
        let path = self.path.clone()?;
        Some(SqliteSourceConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            config_table: self
                .config_table
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIG_TABLE.to_string()),
            query_table: self.query_table.clone().unwrap_or_else(|| DEFAULT_QUERY_TABLE.to_string()),
        })
    }

    /// Validates source configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let path = self.path.as_ref().ok_or_else(|| {
            ConfigError::Invalid(format!("{} source requires path", self.source_type.label()))
        })?;
        validate_path_string("source.path", &path.to_string_lossy())?;
        match self.source_type {
            SourceType::Snapshot => {
                if self.config_table.is_some() || self.query_table.is_some() {
                    return Err(ConfigError::Invalid(
                        "snapshot source must not set table names".to_string(),
                    ));
                }
                Ok(())
            }
            SourceType::Sqlite => {
                if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
                    return Err(ConfigError::Invalid(format!(
                        "source.busy_timeout_ms exceeds {MAX_BUSY_TIMEOUT_MS}"
                    )));
                }
                let Some(sqlite) = self.sqlite_config() else {
                    return Err(ConfigError::Invalid("sqlite source requires path".to_string()));
                };
                sqlite.validate().map_err(|err| ConfigError::Invalid(err.to_string()))
            }
        }
    }
}

impl SourceType {
    /// Returns the config label for the backend.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Snapshot => "snapshot",
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Lifecycle event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkType {
    /// Discard events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Sink type.
    #[serde(default)]
    pub sink: LogSinkType,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkType::File, None) => {
                Err(ConfigError::Invalid("file logging requires logging.path".to_string()))
            }
            (LogSinkType::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            (LogSinkType::None | LogSinkType::Stderr, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid with sink = \"file\"".to_string(),
            )),
            (LogSinkType::None | LogSinkType::Stderr, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        let result = validate_path_string("test_path", "   ");
        assert!(result.unwrap_err().to_string().contains("non-empty"));
    }

    #[test]
    fn validate_path_string_rejects_component_too_long() {
        let long_component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let result = validate_path_string("test_path", &format!("./{long_component}"));
        assert!(result.is_err(), "overlong component should fail");
    }

    #[test]
    fn validate_path_string_accepts_component_at_max() {
        let max_component = "a".repeat(MAX_PATH_COMPONENT_LENGTH);
        assert!(validate_path_string("test_path", &format!("./{max_component}")).is_ok());
    }

    #[test]
    fn validate_path_rejects_total_length_over_limit() {
        let path = PathBuf::from("a/".repeat(MAX_TOTAL_PATH_LENGTH / 2 + 1));
        assert!(validate_path(&path).is_err());
    }

    #[test]
    fn explicit_path_wins_over_defaults() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn report_section_converts_to_params() {
        let config = ReportConfig {
            granularity_seconds: 5,
            tie_policy: TiePolicy::AllInstants,
            ..ReportConfig::default()
        };
        let params = config.to_params();
        assert_eq!(params.granularity_seconds, 5);
        assert_eq!(params.window_seconds, DEFAULT_WINDOW_SECONDS);
        assert_eq!(params.tie_policy, TiePolicy::AllInstants);
    }

    #[test]
    fn busy_timeout_is_bounded() {
        let source = SourceConfig {
            source_type: SourceType::Sqlite,
            path: Some(PathBuf::from("wlm.sqlite")),
            busy_timeout_ms: MAX_BUSY_TIMEOUT_MS + 1,
            config_table: None,
            query_table: None,
        };
        assert!(source.validate().unwrap_err().to_string().contains("busy_timeout_ms"));
    }
}
