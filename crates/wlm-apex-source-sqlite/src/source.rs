// crates/wlm-apex-source-sqlite/src/source.rs
// ============================================================================
// Module: SQLite WLM Log Source
// Description: Read-only WlmLogSource over SQLite copies of the host tables.
// Purpose: Decode config and execution rows with strict validation.
// Dependencies: wlm-apex-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteWlmLogSource`] opens an existing database read-only and checks
//! that both tables exist before any query runs. Table names come from
//! configuration and are validated as plain identifiers before being
//! interpolated into SQL. Timestamps may be stored as INTEGER epoch
//! milliseconds or as TEXT (`YYYY-MM-DD HH:MM:SS[.ffffff]` in UTC, or
//! RFC 3339). Rows that cannot be decoded fail the load; nothing is skipped
//! silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::types::Value;
use serde::Deserialize;
use thiserror::Error;
use wlm_apex_core::ExecutionFilter;
use wlm_apex_core::QueryExecutionRecord;
use wlm_apex_core::QueueClassConfig;
use wlm_apex_core::ServiceClassId;
use wlm_apex_core::SourceError;
use wlm_apex_core::Timestamp;
use wlm_apex_core::UserId;
use wlm_apex_core::WlmLogSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a table identifier.
const MAX_IDENTIFIER_LENGTH: usize = 128;
/// Default service class config table name.
pub const DEFAULT_CONFIG_TABLE: &str = "stv_wlm_service_class_config";
/// Default query execution log table name.
pub const DEFAULT_QUERY_TABLE: &str = "stl_wlm_query";
/// Optional config column holding the row's effective instant.
const EFFECTIVE_FROM_COLUMN: &str = "effective_from";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` log source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteSourceConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Service class config table.
    #[serde(default = "default_config_table")]
    pub config_table: String,
    /// Query execution log table.
    #[serde(default = "default_query_table")]
    pub query_table: String,
}

impl SqliteSourceConfig {
    /// Creates a config for `path` with default table names.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            config_table: default_config_table(),
            query_table: default_query_table(),
        }
    }

    /// Validates path limits and table identifiers without touching disk.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteSourceError::Invalid`] when a setting is out of bounds.
    pub fn validate(&self) -> Result<(), SqliteSourceError> {
        validate_source_path(&self.path)?;
        validate_identifier(&self.config_table)?;
        validate_identifier(&self.query_table)?;
        Ok(())
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default config table name.
fn default_config_table() -> String {
    DEFAULT_CONFIG_TABLE.to_string()
}

/// Returns the default query table name.
fn default_query_table() -> String {
    DEFAULT_QUERY_TABLE.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` source errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteSourceError {
    /// Database file or table is missing.
    #[error("sqlite source unavailable: {0}")]
    Unavailable(String),
    /// `SQLite` engine error.
    #[error("sqlite source db error: {0}")]
    Db(String),
    /// Stored row could not be decoded.
    #[error("sqlite source corruption: {0}")]
    Corrupt(String),
    /// Invalid source settings.
    #[error("sqlite source invalid config: {0}")]
    Invalid(String),
}

impl From<SqliteSourceError> for SourceError {
    fn from(error: SqliteSourceError) -> Self {
        match error {
            SqliteSourceError::Unavailable(message) => Self::Unavailable(message),
            SqliteSourceError::Db(message) => Self::Unavailable(format!("sqlite: {message}")),
            SqliteSourceError::Corrupt(message) => Self::Corrupt(message),
            SqliteSourceError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Read-only `SQLite` log source.
pub struct SqliteWlmLogSource {
    /// Source configuration.
    config: SqliteSourceConfig,
    /// Read-only connection guarded by a mutex.
    connection: Mutex<Connection>,
    /// Whether the config table carries `effective_from`.
    versioned_configs: bool,
    /// Whether config rows can be ordered by insertion (`rowid`).
    config_rowid: bool,
}

impl SqliteWlmLogSource {
    /// Opens the database and checks that both tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteSourceError`] when the settings are invalid, the file
    /// or a table is missing, or the database cannot be opened.
    pub fn open(config: SqliteSourceConfig) -> Result<Self, SqliteSourceError> {
        config.validate()?;
        if !config.path.is_file() {
            return Err(SqliteSourceError::Unavailable(format!(
                "database not found: {}",
                config.path.display()
            )));
        }
        let connection = open_connection(&config)?;
        let config_rowid = ensure_table(&connection, &config.config_table)?;
        ensure_table(&connection, &config.query_table)?;
        let versioned_configs =
            table_has_column(&connection, &config.config_table, EFFECTIVE_FROM_COLUMN)?;
        Ok(Self {
            config,
            connection: Mutex::new(connection),
            versioned_configs,
            config_rowid,
        })
    }

    /// Returns the source configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteSourceConfig {
        &self.config
    }

    /// Returns true when config rows carry an effective instant.
    #[must_use]
    pub const fn has_versioned_configs(&self) -> bool {
        self.versioned_configs
    }

    /// Loads every config row, oldest insert first within a class.
    ///
    /// Views and `WITHOUT ROWID` tables keep the engine's scan order within a class.
    fn load_configs(&self) -> Result<Vec<QueueClassConfig>, SqliteSourceError> {
        let effective_from =
            if self.versioned_configs { EFFECTIVE_FROM_COLUMN } else { "NULL" };
        let order = if self.config_rowid { "service_class, rowid" } else { "service_class" };
        let sql = format!(
            "SELECT service_class, num_query_tasks, {effective_from} FROM {} ORDER BY {order}",
            self.config.config_table
        );
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteSourceError::Db("mutex poisoned".to_string()))?;
        let mut statement =
            guard.prepare(&sql).map_err(|err| SqliteSourceError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![], map_config_row)
            .map_err(|err| SqliteSourceError::Db(err.to_string()))?;
        let mut configs = Vec::new();
        for row in rows {
            let (service_class, concurrency, effective_from) =
                row.map_err(|err| SqliteSourceError::Corrupt(err.to_string()))?;
            let effective_from = match effective_from {
                Value::Null => None,
                other => Some(decode_timestamp(other, "effective_from")?),
            };
            configs.push(QueueClassConfig {
                service_class: ServiceClassId::new(service_class),
                configured_concurrency: concurrency,
                effective_from,
            });
        }
        Ok(configs)
    }

    /// Loads execution rows above the class and user thresholds.
    fn load_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<QueryExecutionRecord>, SqliteSourceError> {
        let sql = format!(
            "SELECT userid, service_class, slot_count, service_class_start_time, \
             service_class_end_time FROM {} WHERE userid > ?1 AND service_class > ?2",
            self.config.query_table
        );
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteSourceError::Db("mutex poisoned".to_string()))?;
        let mut statement =
            guard.prepare(&sql).map_err(|err| SqliteSourceError::Db(err.to_string()))?;
        let rows = statement
            .query_map(
                params![filter.min_user_id.get(), filter.min_service_class.get()],
                map_execution_row,
            )
            .map_err(|err| SqliteSourceError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| SqliteSourceError::Corrupt(err.to_string()))?;
            let record = QueryExecutionRecord {
                service_class: ServiceClassId::new(raw.service_class),
                user_id: UserId::new(raw.user_id),
                slot_count: raw.slot_count,
                active_start: decode_timestamp(raw.start, "service_class_start_time")?,
                active_end: decode_timestamp(raw.end, "service_class_end_time")?,
            };
            if filter.accepts(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl WlmLogSource for SqliteWlmLogSource {
    fn service_class_configs(&self) -> Result<Vec<QueueClassConfig>, SourceError> {
        self.load_configs().map_err(SourceError::from)
    }

    fn query_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<QueryExecutionRecord>, SourceError> {
        self.load_executions(filter).map_err(SourceError::from)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Undecoded execution row.
struct RawExecutionRow {
    /// `userid` column.
    user_id: i64,
    /// `service_class` column.
    service_class: i64,
    /// `slot_count` column.
    slot_count: i64,
    /// `service_class_start_time` column.
    start: Value,
    /// `service_class_end_time` column.
    end: Value,
}

/// Maps a config row into its raw columns.
fn map_config_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, Value)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

/// Maps an execution row into its raw columns.
fn map_execution_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawExecutionRow> {
    Ok(RawExecutionRow {
        user_id: row.get(0)?,
        service_class: row.get(1)?,
        slot_count: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
    })
}

/// Decodes an INTEGER (epoch ms) or TEXT timestamp column.
fn decode_timestamp(value: Value, column: &str) -> Result<Timestamp, SqliteSourceError> {
    match value {
        Value::Integer(millis) => Ok(Timestamp::from_unix_millis(millis)),
        Value::Text(text) => Timestamp::parse_host_text(&text)
            .map_err(|err| SqliteSourceError::Corrupt(format!("{column}: {err}"))),
        Value::Null => Err(SqliteSourceError::Corrupt(format!("{column} is null"))),
        Value::Real(_) | Value::Blob(_) => {
            Err(SqliteSourceError::Corrupt(format!("{column} has unsupported type")))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates source paths for safety limits.
fn validate_source_path(path: &Path) -> Result<(), SqliteSourceError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteSourceError::Invalid("source path is empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteSourceError::Invalid("source path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteSourceError::Invalid(
                "source path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteSourceError::Invalid(
            "source path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Validates a table name as a plain SQL identifier.
fn validate_identifier(name: &str) -> Result<(), SqliteSourceError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(SqliteSourceError::Invalid("table name is empty".to_string()));
    };
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SqliteSourceError::Invalid(format!("table name too long: {name}")));
    }
    if !(first.is_ascii_alphabetic() || first == '_')
        || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(SqliteSourceError::Invalid(format!("invalid table name: {name}")));
    }
    Ok(())
}

/// Opens a read-only `SQLite` connection.
fn open_connection(config: &SqliteSourceConfig) -> Result<Connection, SqliteSourceError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteSourceError::Unavailable(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteSourceError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA query_only = ON;")
        .map_err(|err| SqliteSourceError::Db(err.to_string()))?;
    Ok(connection)
}

/// Fails when `table` is not a table or view in the database.
///
/// Returns true when `table` is a rowid table.
fn ensure_table(connection: &Connection, table: &str) -> Result<bool, SqliteSourceError> {
    let found: Option<bool> = connection
        .query_row(
            "SELECT type = 'table' AND COALESCE(sql, '') NOT LIKE '%WITHOUT ROWID%' FROM \
             sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteSourceError::Unavailable(err.to_string()))?;
    found.ok_or_else(|| SqliteSourceError::Unavailable(format!("table not found: {table}")))
}

/// Returns true when `table` has a column named `column`.
fn table_has_column(
    connection: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, SqliteSourceError> {
    let found: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteSourceError::Db(err.to_string()))?;
    Ok(found.is_some())
}
