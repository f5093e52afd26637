use std::collections::HashSet;

use tempfile::TempDir;
use vitals_common::types::{Metric, MetricKind};

use crate::error::StorageError;
use crate::memory::MemoryRepository;
use crate::sqlite::SqliteRepository;
use crate::Repository;

fn sqlite_repo(dir: &TempDir) -> SqliteRepository {
    SqliteRepository::open(&dir.path().join("metrics.db")).unwrap()
}

/// Runs the same assertions against both backends; the Repository
/// contract does not distinguish them.
fn with_each_repo(check: impl Fn(&dyn Repository)) {
    let memory = MemoryRepository::new();
    check(&memory);

    let dir = TempDir::new().unwrap();
    let sqlite = sqlite_repo(&dir);
    check(&sqlite);
}

fn triples(metrics: &[Metric]) -> HashSet<(String, String, String)> {
    metrics
        .iter()
        .map(|m| {
            (
                m.id.clone(),
                m.kind.to_string(),
                m.value_string().unwrap_or_default(),
            )
        })
        .collect()
}

#[test]
fn counter_updates_accumulate() {
    with_each_repo(|repo| {
        repo.set(&Metric::counter("hits", 5)).unwrap();
        let result = repo.set(&Metric::counter("hits", 3)).unwrap();
        assert_eq!(result.delta, Some(8));

        let stored = repo.get("hits", MetricKind::Counter).unwrap();
        assert_eq!(stored.delta, Some(8));
    });
}

#[test]
fn counter_sum_is_order_independent() {
    let deltas = [7, -2, 40, 1, 1];
    let mut reversed = deltas;
    reversed.reverse();

    with_each_repo(|repo| {
        for d in deltas {
            repo.set(&Metric::counter("fwd", d)).unwrap();
        }
        for d in reversed {
            repo.set(&Metric::counter("rev", d)).unwrap();
        }
        let fwd = repo.get("fwd", MetricKind::Counter).unwrap();
        let rev = repo.get("rev", MetricKind::Counter).unwrap();
        assert_eq!(fwd.delta, Some(deltas.iter().sum()));
        assert_eq!(fwd.delta, rev.delta);
    });
}

#[test]
fn first_counter_write_applies_delta() {
    // A brand-new counter is initialized to zero and the incoming delta
    // is added in the same call: the first write's delta is the stored
    // value, no prior "create" step is required.
    with_each_repo(|repo| {
        let result = repo.set(&Metric::counter("fresh", 527)).unwrap();
        assert_eq!(result.delta, Some(527));
        let stored = repo.get("fresh", MetricKind::Counter).unwrap();
        assert_eq!(stored.delta, Some(527));
    });
}

#[test]
fn gauge_set_replaces() {
    with_each_repo(|repo| {
        repo.set(&Metric::gauge("temp", 36.6)).unwrap();
        let result = repo.set(&Metric::gauge("temp", 37.1)).unwrap();
        assert_eq!(result.value, Some(37.1));

        let stored = repo.get("temp", MetricKind::Gauge).unwrap();
        assert_eq!(stored.value, Some(37.1));
    });
}

#[test]
fn kind_change_is_rejected_and_state_untouched() {
    with_each_repo(|repo| {
        repo.set(&Metric::counter("c1", 10)).unwrap();
        let err = repo.set(&Metric::gauge("c1", 1.5)).unwrap_err();
        assert!(matches!(err, StorageError::TypeMismatch { .. }));
        let stored = repo.get("c1", MetricKind::Counter).unwrap();
        assert_eq!(stored.delta, Some(10));

        repo.set(&Metric::gauge("g1", -0.1)).unwrap();
        let err = repo.set(&Metric::counter("g1", 1)).unwrap_err();
        assert!(matches!(err, StorageError::TypeMismatch { .. }));
        let stored = repo.get("g1", MetricKind::Gauge).unwrap();
        assert_eq!(stored.value, Some(-0.1));
    });
}

#[test]
fn missing_payload_is_rejected() {
    with_each_repo(|repo| {
        let mut counter = Metric::counter("c1", 0);
        counter.delta = None;
        assert!(matches!(
            repo.set(&counter).unwrap_err(),
            StorageError::MissingDelta { .. }
        ));

        let mut gauge = Metric::gauge("g1", 0.0);
        gauge.value = None;
        assert!(matches!(
            repo.set(&gauge).unwrap_err(),
            StorageError::MissingValue { .. }
        ));
    });
}

#[test]
fn get_missing_metric_is_not_found() {
    with_each_repo(|repo| {
        let err = repo.get("missing", MetricKind::Counter).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    });
}

#[test]
fn get_with_wrong_kind_is_mismatch() {
    with_each_repo(|repo| {
        repo.set(&Metric::counter("hits", 1)).unwrap();
        let err = repo.get("hits", MetricKind::Gauge).unwrap_err();
        assert!(matches!(err, StorageError::TypeMismatch { .. }));
    });
}

#[test]
fn get_all_returns_final_values_as_a_set() {
    with_each_repo(|repo| {
        repo.set(&Metric::counter("hits", 5)).unwrap();
        repo.set(&Metric::counter("hits", 3)).unwrap();
        repo.set(&Metric::gauge("temp", 36.6)).unwrap();
        repo.set(&Metric::gauge("temp", 37.1)).unwrap();
        repo.set(&Metric::gauge("load", 0.25)).unwrap();

        let all = repo.get_all().unwrap();
        let expected = [
            Metric::counter("hits", 8),
            Metric::gauge("temp", 37.1),
            Metric::gauge("load", 0.25),
        ];
        assert_eq!(triples(&all), triples(&expected));
    });
}

#[test]
fn dump_restore_round_trips_within_each_backend() {
    with_each_repo(|repo| {
        repo.set(&Metric::counter("hits", 42)).unwrap();
        repo.set(&Metric::gauge("temp", -0.5)).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        repo.dump(&path).unwrap();

        let fresh = MemoryRepository::new();
        fresh.restore(&path).unwrap();
        assert_eq!(
            triples(&fresh.get_all().unwrap()),
            triples(&repo.get_all().unwrap())
        );
    });
}

#[test]
fn snapshot_moves_between_backends() {
    let memory = MemoryRepository::new();
    memory.set(&Metric::counter("hits", 9)).unwrap();
    memory.set(&Metric::gauge("temp", 21.5)).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");
    memory.dump(&path).unwrap();

    let sqlite = sqlite_repo(&dir);
    sqlite.restore(&path).unwrap();
    assert_eq!(
        triples(&sqlite.get_all().unwrap()),
        triples(&memory.get_all().unwrap())
    );

    // And back again.
    let path2 = dir.path().join("snapshot2.json");
    sqlite.dump(&path2).unwrap();
    let memory2 = MemoryRepository::new();
    memory2.restore(&path2).unwrap();
    assert_eq!(
        triples(&memory2.get_all().unwrap()),
        triples(&memory.get_all().unwrap())
    );
}

#[test]
fn restore_replaces_same_id_entries() {
    let source = MemoryRepository::new();
    source.set(&Metric::gauge("temp", 40.0)).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");
    source.dump(&path).unwrap();

    with_each_repo(|repo| {
        repo.set(&Metric::gauge("temp", 1.0)).unwrap();
        repo.set(&Metric::counter("hits", 2)).unwrap();
        repo.restore(&path).unwrap();

        let temp = repo.get("temp", MetricKind::Gauge).unwrap();
        assert_eq!(temp.value, Some(40.0));
        // Entries absent from the snapshot survive.
        let hits = repo.get("hits", MetricKind::Counter).unwrap();
        assert_eq!(hits.delta, Some(2));
    });
}

#[test]
fn restore_missing_file_is_a_noop() {
    with_each_repo(|repo| {
        repo.set(&Metric::counter("hits", 1)).unwrap();
        repo.restore(std::path::Path::new("no/such/snapshot.json"))
            .unwrap();
        assert_eq!(repo.get_all().unwrap().len(), 1);
    });
}

#[test]
fn sqlite_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.db");

    {
        let repo = SqliteRepository::open(&path).unwrap();
        repo.set(&Metric::counter("hits", 12)).unwrap();
        repo.set(&Metric::gauge("temp", 3.5)).unwrap();
    }

    let repo = SqliteRepository::open(&path).unwrap();
    assert_eq!(
        repo.get("hits", MetricKind::Counter).unwrap().delta,
        Some(12)
    );
    assert_eq!(repo.get("temp", MetricKind::Gauge).unwrap().value, Some(3.5));
}

#[test]
fn ping_reflects_backing_store() {
    let memory = MemoryRepository::new();
    assert!(matches!(
        memory.ping().unwrap_err(),
        StorageError::ProbeUnsupported
    ));

    let dir = TempDir::new().unwrap();
    let sqlite = sqlite_repo(&dir);
    sqlite.ping().unwrap();
}
