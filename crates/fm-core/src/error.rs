//! Error types for fm-core

use thiserror::Error;

/// Core error type for fuzzermon migrations
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Circular dependency between migrations
    #[error("[E003] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E004: Two records share the same key
    #[error("[E004] Duplicate migration: {key}")]
    DuplicateMigration { key: String },

    /// E005: Referenced migration is not in the catalog
    #[error("[E005] Migration not found: {key}")]
    MigrationNotFound { key: String },

    /// E006: Record is structurally invalid
    #[error("[E006] Invalid migration {key}: {reason}")]
    InvalidMigration { key: String, reason: String },

    /// E007: Malformed migration key
    #[error("[E007] Invalid migration key '{value}': expected '<app>.<name>'")]
    InvalidKey { value: String },

    /// E008: Operation conflicts with the schema built so far
    #[error("[E008] Schema conflict in {key}: {reason}")]
    SchemaConflict { key: String, reason: String },

    /// E009: Foreign key names a table that does not exist yet
    #[error("[E009] Migration {key} references unknown table '{table}'")]
    UnknownTable { key: String, table: String },

    /// E010: IO error
    #[error("[E010] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E011: IO error with file path context
    #[error("[E011] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E012: Migration file could not be parsed
    #[error("[E012] Failed to parse migration file {path}: {details}")]
    MigrationParseError { path: String, details: String },

    /// E013: YAML parse error
    #[error("[E013] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
