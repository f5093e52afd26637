use vitals_common::types::{MetricKind, UnsupportedKind};

/// Errors produced by the storage layer.
///
/// Every variant is returned to the caller; the HTTP status mapping is the
/// handler's job, the repository never panics on bad input or I/O failure.
///
/// # Examples
///
/// ```
/// use vitals_storage::error::StorageError;
///
/// let err = StorageError::NotFound { id: "hits".to_string() };
/// assert!(err.to_string().contains("hits"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested metric ID is not stored.
    #[error("metric {id} not found")]
    NotFound { id: String },

    /// The metric ID exists under a different kind. The stored kind of an
    /// ID is immutable for the process lifetime.
    #[error("metric {id} is stored as {stored}, requested as {requested}")]
    TypeMismatch {
        id: String,
        stored: MetricKind,
        requested: MetricKind,
    },

    /// A counter update arrived without a delta.
    #[error("counter update for {id} carries no delta")]
    MissingDelta { id: String },

    /// A gauge update arrived without a value.
    #[error("gauge update for {id} carries no value")]
    MissingValue { id: String },

    /// A stored kind string could not be parsed (corrupt SQL row).
    #[error(transparent)]
    UnsupportedKind(#[from] UnsupportedKind),

    /// Snapshot serialization or deserialization failure.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Snapshot file I/O failure.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The repository has no backing store to probe.
    #[error("no backing store configured for this repository")]
    ProbeUnsupported,
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
