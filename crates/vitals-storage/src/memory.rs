use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use vitals_common::types::{Metric, MetricKind};

use crate::error::{Result, StorageError};
use crate::snapshot::{self, Entry};
use crate::Repository;

/// In-memory metric store.
///
/// One map-wide lock covers every operation; request handlers and the
/// snapshot loop acquire it identically, so dumps always see a consistent
/// state.
pub struct MemoryRepository {
    metrics: Mutex<HashMap<String, Entry>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            metrics: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MemoryRepository {
    fn set(&self, metric: &Metric) -> Result<Metric> {
        let mut metrics = self.metrics.lock().unwrap();

        if let Some(stored) = metrics.get(&metric.id) {
            if stored.kind != metric.kind {
                return Err(StorageError::TypeMismatch {
                    id: metric.id.clone(),
                    stored: stored.kind,
                    requested: metric.kind,
                });
            }
        }

        match metric.kind {
            MetricKind::Gauge => {
                let value = metric.value.ok_or_else(|| StorageError::MissingValue {
                    id: metric.id.clone(),
                })?;
                metrics.insert(
                    metric.id.clone(),
                    Entry {
                        kind: MetricKind::Gauge,
                        delta: None,
                        value: Some(value),
                    },
                );
                Ok(Metric::gauge(metric.id.clone(), value))
            }
            MetricKind::Counter => {
                let delta = metric.delta.ok_or_else(|| StorageError::MissingDelta {
                    id: metric.id.clone(),
                })?;
                // A new counter starts from zero, then the incoming delta
                // is applied in the same call.
                let entry = metrics.entry(metric.id.clone()).or_insert(Entry {
                    kind: MetricKind::Counter,
                    delta: Some(0),
                    value: None,
                });
                let total = entry.delta.unwrap_or(0) + delta;
                entry.delta = Some(total);
                Ok(Metric::counter(metric.id.clone(), total))
            }
        }
    }

    fn get(&self, id: &str, kind: MetricKind) -> Result<Metric> {
        let metrics = self.metrics.lock().unwrap();
        let stored = metrics
            .get(id)
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        if stored.kind != kind {
            return Err(StorageError::TypeMismatch {
                id: id.to_string(),
                stored: stored.kind,
                requested: kind,
            });
        }
        Ok(stored.to_metric(id))
    }

    fn get_all(&self) -> Result<Vec<Metric>> {
        let metrics = self.metrics.lock().unwrap();
        Ok(metrics
            .iter()
            .map(|(id, entry)| entry.to_metric(id))
            .collect())
    }

    fn dump(&self, path: &Path) -> Result<()> {
        let metrics = self.metrics.lock().unwrap();
        snapshot::write(path, &metrics)
    }

    fn restore(&self, path: &Path) -> Result<()> {
        let Some(entries) = snapshot::read(path)? else {
            return Ok(());
        };
        let mut metrics = self.metrics.lock().unwrap();
        metrics.extend(entries);
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        Err(StorageError::ProbeUnsupported)
    }
}
