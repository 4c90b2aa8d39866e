use thiserror::Error;

/// Error type for snapshot store and storage-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Optimistic concurrency conflict: the stored version did not match the expected one.
    #[error("concurrency conflict on {key} (expected version {expected}, actual {actual})")]
    ConcurrencyConflict {
        key: String,
        expected: i64,
        actual: i64,
    },
    /// A write tried to commit a version that can never be committed.
    #[error("invalid version {version} for {key}")]
    InvalidVersion { key: String, version: i64 },
    /// Serialization/deserialization error.
    #[error("snapshot serialization error: {0}")]
    Serde(String),
    /// Storage-level error.
    #[error("snapshot storage error: {0}")]
    Storage(String),
    #[error("snapshot store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// The query could not be adjusted to the schema.
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
}

impl StoreError {
    /// True for the only recoverable failure: a lost optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// Error type for adjusting a filter tree to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("invalid value for {path}: expected {expected}, found {found}")]
    InvalidValue {
        path: String,
        expected: &'static str,
        found: String,
    },
    #[error("operator {op} is not supported on {path}")]
    UnsupportedOperator { path: String, op: &'static str },
}

/// Error type for loading [`StateOptions`](crate::config::StateOptions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
