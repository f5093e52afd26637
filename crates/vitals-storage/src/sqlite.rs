use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use vitals_common::types::{Metric, MetricKind};

use crate::error::{Result, StorageError};
use crate::snapshot::{self, Entry};
use crate::Repository;

/// SQLite-backed metric store.
///
/// Same update semantics as the in-memory map, driven by upserts against a
/// single `metrics` table. The connection-wide lock plays the role the
/// map-wide lock plays in [`crate::memory::MemoryRepository`].
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Opens (creating if needed) the database file and its schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS metrics (
                id    TEXT PRIMARY KEY,
                kind  TEXT NOT NULL,
                delta INTEGER,
                value REAL
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn stored_entry(conn: &Connection, id: &str) -> Result<Option<Entry>> {
        let row = conn
            .query_row(
                "SELECT kind, delta, value FROM metrics WHERE id = ?1",
                rusqlite::params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((kind, delta, value)) = row else {
            return Ok(None);
        };
        Ok(Some(Entry {
            kind: kind.parse::<MetricKind>()?,
            delta,
            value,
        }))
    }
}

impl Repository for SqliteRepository {
    fn set(&self, metric: &Metric) -> Result<Metric> {
        let conn = self.conn.lock().unwrap();

        let stored = Self::stored_entry(&conn, &metric.id)?;
        if let Some(entry) = &stored {
            if entry.kind != metric.kind {
                return Err(StorageError::TypeMismatch {
                    id: metric.id.clone(),
                    stored: entry.kind,
                    requested: metric.kind,
                });
            }
        }

        match metric.kind {
            MetricKind::Gauge => {
                let value = metric.value.ok_or_else(|| StorageError::MissingValue {
                    id: metric.id.clone(),
                })?;
                conn.execute(
                    "INSERT INTO metrics (id, kind, value) VALUES (?1, 'gauge', ?2)
                     ON CONFLICT(id) DO UPDATE SET value = excluded.value",
                    rusqlite::params![&metric.id, value],
                )?;
                Ok(Metric::gauge(metric.id.clone(), value))
            }
            MetricKind::Counter => {
                let delta = metric.delta.ok_or_else(|| StorageError::MissingDelta {
                    id: metric.id.clone(),
                })?;
                let total = stored.and_then(|e| e.delta).unwrap_or(0) + delta;
                conn.execute(
                    "INSERT INTO metrics (id, kind, delta) VALUES (?1, 'counter', ?2)
                     ON CONFLICT(id) DO UPDATE SET delta = excluded.delta",
                    rusqlite::params![&metric.id, total],
                )?;
                Ok(Metric::counter(metric.id.clone(), total))
            }
        }
    }

    fn get(&self, id: &str, kind: MetricKind) -> Result<Metric> {
        let conn = self.conn.lock().unwrap();
        let entry = Self::stored_entry(&conn, id)?
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;
        if entry.kind != kind {
            return Err(StorageError::TypeMismatch {
                id: id.to_string(),
                stored: entry.kind,
                requested: kind,
            });
        }
        Ok(entry.to_metric(id))
    }

    fn get_all(&self) -> Result<Vec<Metric>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, kind, delta, value FROM metrics")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, kind, delta, value) = row?;
            result.push(Metric {
                id,
                kind: kind.parse::<MetricKind>()?,
                delta,
                value,
            });
        }
        Ok(result)
    }

    fn dump(&self, path: &Path) -> Result<()> {
        let entries: HashMap<String, Entry> = self
            .get_all()?
            .into_iter()
            .map(|m| {
                (
                    m.id,
                    Entry {
                        kind: m.kind,
                        delta: m.delta,
                        value: m.value,
                    },
                )
            })
            .collect();
        snapshot::write(path, &entries)
    }

    fn restore(&self, path: &Path) -> Result<()> {
        let Some(entries) = snapshot::read(path)? else {
            return Ok(());
        };
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO metrics (id, kind, delta, value) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (id, entry) in &entries {
                stmt.execute(rusqlite::params![
                    id,
                    entry.kind.to_string(),
                    entry.delta,
                    entry.value,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
