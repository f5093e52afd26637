//! Storage layer for accumulated metrics.
//!
//! Two backends implement the same [`Repository`] contract: an in-memory
//! map ([`memory::MemoryRepository`]) and a SQLite table
//! ([`sqlite::SqliteRepository`]). Both share one JSON snapshot format, so
//! a dump taken by either can be restored into the other.

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod sqlite;

#[cfg(test)]
mod tests;

use std::path::Path;

use vitals_common::types::{Metric, MetricKind};

use crate::error::Result;

/// Persistence contract shared by all metric stores.
///
/// Implementations must be safe to share across threads (`Send + Sync`):
/// the server calls them from concurrent request handlers and from the
/// background snapshot loop, all through one `Arc<dyn Repository>`.
pub trait Repository: Send + Sync {
    /// Applies one update and returns the resulting stored metric.
    ///
    /// Gauges overwrite: the returned metric carries the value just set.
    /// Counters accumulate: a new ID starts from a stored delta of zero
    /// and the incoming delta is added to it, so the first write's delta
    /// becomes the stored value; the returned metric carries the
    /// post-update cumulative delta.
    ///
    /// # Errors
    ///
    /// [`error::StorageError::TypeMismatch`] when the ID already exists
    /// under the other kind (stored value untouched),
    /// [`error::StorageError::MissingDelta`] /
    /// [`error::StorageError::MissingValue`] when the payload required by
    /// the kind is absent.
    fn set(&self, metric: &Metric) -> Result<Metric>;

    /// Reads the current value of `id`, checked against the requested
    /// kind.
    fn get(&self, id: &str, kind: MetricKind) -> Result<Metric>;

    /// Returns every stored metric. Order is unspecified.
    fn get_all(&self) -> Result<Vec<Metric>>;

    /// Serializes the entire current state to `path`, overwriting any
    /// existing file.
    fn dump(&self, path: &Path) -> Result<()>;

    /// Loads a snapshot from `path` into the live state, replacing
    /// same-ID entries. A nonexistent file is a no-op success (first run).
    fn restore(&self, path: &Path) -> Result<()>;

    /// Probes backing-store connectivity. Repositories without a backing
    /// store report [`error::StorageError::ProbeUnsupported`].
    fn ping(&self) -> Result<()>;
}
