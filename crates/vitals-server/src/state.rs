use std::path::PathBuf;
use std::sync::Arc;

use vitals_storage::Repository;

/// Shared handler state, built once at startup and cloned per request.
///
/// The repository is injected here by the constructor in `main`; handlers
/// and the snapshot loop see the same instance through the same `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub snapshot_path: Arc<PathBuf>,
    /// True when the snapshot interval is zero: every successful write
    /// dumps the state synchronously instead of a background loop.
    pub sync_dump: bool,
}
