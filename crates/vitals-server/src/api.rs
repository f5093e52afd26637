use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use vitals_common::types::{Metric, MetricKind};
use vitals_storage::error::StorageError;

use crate::state::AppState;

/// Upper bound on the `/ping` backing-store probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Maps a storage rejection to the response status: unknown ID is a 404,
/// a contract violation in the request is a 400, anything else is an
/// internal persistence failure.
fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
        StorageError::TypeMismatch { .. }
        | StorageError::MissingDelta { .. }
        | StorageError::MissingValue { .. }
        | StorageError::UnsupportedKind(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// In synchronous-dump mode every successful write persists the full
/// state before the response goes out.
fn dump_if_sync(state: &AppState) -> Result<(), Response> {
    if !state.sync_dump {
        return Ok(());
    }
    state.repo.dump(&state.snapshot_path).map_err(|e| {
        tracing::error!(error = %e, "synchronous snapshot failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

fn absent_body(id: &str) -> String {
    format!("Value of {id} is absent\n")
}

/// POST /update/{kind}/{name}/{value} — path-encoded single update.
pub async fn update_path(
    State(state): State<AppState>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Response {
    if name.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    let kind: MetricKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!(error = %e, "rejected update");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let metric = match kind {
        MetricKind::Gauge => match value.parse::<f64>() {
            Ok(v) => Metric::gauge(name, v),
            Err(e) => {
                tracing::warn!(value = %value, error = %e, "rejected gauge value");
                return StatusCode::BAD_REQUEST.into_response();
            }
        },
        MetricKind::Counter => match value.parse::<i64>() {
            Ok(d) => Metric::counter(name, d),
            Err(e) => {
                tracing::warn!(value = %value, error = %e, "rejected counter delta");
                return StatusCode::BAD_REQUEST.into_response();
            }
        },
    };

    match state.repo.set(&metric) {
        Ok(_) => match dump_if_sync(&state) {
            Ok(()) => StatusCode::OK.into_response(),
            Err(resp) => resp,
        },
        Err(e) => {
            tracing::warn!(id = %metric.id, error = %e, "update rejected");
            storage_status(&e).into_response()
        }
    }
}

/// POST /update/ — body-encoded single update; responds with the
/// post-update metric.
pub async fn update_body(State(state): State<AppState>, body: Bytes) -> Response {
    let metric: Metric = match serde_json::from_slice(&body) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::warn!(error = %e, "cannot decode update body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    if metric.id.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }

    match state.repo.set(&metric) {
        Ok(result) => match dump_if_sync(&state) {
            Ok(()) => (StatusCode::OK, Json(result)).into_response(),
            Err(resp) => resp,
        },
        Err(e) => {
            tracing::warn!(id = %metric.id, error = %e, "update rejected");
            storage_status(&e).into_response()
        }
    }
}

/// POST /updates/ — body-encoded batch update; applies each metric in
/// order and responds with the post-update batch. The first rejection
/// aborts the request.
pub async fn updates_body(State(state): State<AppState>, body: Bytes) -> Response {
    let batch: Vec<Metric> = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(error = %e, "cannot decode batch body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut results = Vec::with_capacity(batch.len());
    for metric in &batch {
        if metric.id.is_empty() {
            return StatusCode::NOT_FOUND.into_response();
        }
        match state.repo.set(metric) {
            Ok(result) => results.push(result),
            Err(e) => {
                tracing::warn!(id = %metric.id, error = %e, "batch update rejected");
                return storage_status(&e).into_response();
            }
        }
    }

    // One dump covers the whole batch.
    match dump_if_sync(&state) {
        Ok(()) => (StatusCode::OK, Json(results)).into_response(),
        Err(resp) => resp,
    }
}

/// GET /value/{kind}/{name} — path-encoded read, textual response.
pub async fn value_path(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Response {
    if name.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    let kind: MetricKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!(error = %e, "rejected read");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match state.repo.get(&name, kind) {
        Ok(metric) => {
            let text = metric.value_string().unwrap_or_default();
            (StatusCode::OK, format!("{text}\n")).into_response()
        }
        Err(StorageError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, absent_body(&name)).into_response()
        }
        Err(e) => {
            tracing::warn!(id = %name, error = %e, "read rejected");
            storage_status(&e).into_response()
        }
    }
}

/// POST /value/ — body-encoded read; responds with the stored metric as
/// JSON.
pub async fn value_body(State(state): State<AppState>, body: Bytes) -> Response {
    let metric: Metric = match serde_json::from_slice(&body) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::warn!(error = %e, "cannot decode read body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    if metric.id.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }

    match state.repo.get(&metric.id, metric.kind) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(StorageError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, absent_body(&metric.id)).into_response()
        }
        Err(e) => {
            tracing::warn!(id = %metric.id, error = %e, "read rejected");
            storage_status(&e).into_response()
        }
    }
}

/// GET / — every stored metric, as a JSON array when the client asks for
/// it, as a `name:\tvalue` text listing otherwise.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let metrics = match state.repo.get_all() {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::error!(error = %e, "cannot list metrics");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    if wants_json {
        return Json(metrics).into_response();
    }

    let mut body = String::new();
    for metric in &metrics {
        body.push_str(&metric.id);
        body.push_str(":\t");
        body.push_str(&metric.value_string().unwrap_or_default());
        body.push('\n');
    }
    body.into_response()
}

/// GET /ping — bounded backing-store probe, status code only.
pub async fn ping(State(state): State<AppState>) -> Response {
    let repo = state.repo.clone();
    let probe = tokio::task::spawn_blocking(move || repo.ping());
    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(Ok(()))) => StatusCode::OK.into_response(),
        Ok(Ok(Err(e))) => {
            tracing::warn!(error = %e, "backing store probe failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "backing store probe panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(_) => {
            tracing::warn!("backing store probe timed out");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
