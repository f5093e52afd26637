//! On-disk snapshot format shared by both repository backends.
//!
//! A snapshot is a JSON object mapping metric ID to its stored entry,
//! written by whole-file overwrite and read back verbatim on restore.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vitals_common::types::{Metric, MetricKind};

use crate::error::Result;

/// One stored entry: the kind plus the payload slot that kind uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Entry {
    pub fn to_metric(&self, id: &str) -> Metric {
        Metric {
            id: id.to_string(),
            kind: self.kind,
            delta: self.delta,
            value: self.value,
        }
    }
}

/// Writes the full state as pretty-printed JSON, overwriting `path`.
pub fn write(path: &Path, entries: &HashMap<String, Entry>) -> Result<()> {
    let data = serde_json::to_vec_pretty(entries)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Reads a snapshot back. A missing file yields `Ok(None)` so first-run
/// restores succeed without touching state.
pub fn read(path: &Path) -> Result<Option<HashMap<String, Entry>>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&data)?))
}
