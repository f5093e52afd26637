//! Batch delivery to the collector.
//!
//! Payloads are JSON, gzip-compressed, POSTed with a fixed backoff
//! schedule. Any HTTP response counts as delivery; only transport-level
//! failures consume backoff slots and trigger a retry.

use std::io::Write;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use vitals_common::types::Metric;

/// Wait applied after each failed attempt, in order. Exhausting the
/// schedule drops the batch; nothing is persisted for a later retry.
pub const BACKOFF_SCHEDULE: [Duration; 3] = [
    Duration::from_millis(100),
    Duration::from_millis(500),
    Duration::from_secs(1),
];

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("batch encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("gzip compression failed: {0}")]
    Compress(#[from] std::io::Error),
    #[error("no response after {attempts} attempts: {source}")]
    Exhausted {
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },
}

pub struct Sender {
    client: reqwest::Client,
    base_url: String,
}

impl Sender {
    pub fn new(server_addr: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{server_addr}"),
        }
    }

    /// Delivers one report cycle's batch to the collector's array
    /// endpoint.
    pub async fn send_batch(&self, batch: &[Metric]) -> Result<(), SendError> {
        let body = gzip(&serde_json::to_vec(batch)?)?;
        self.deliver(format!("{}/updates/", self.base_url), body)
            .await
    }

    /// Delivers a single metric to the single-object endpoint. Same
    /// encode/compress/retry contract as the batch path, one call per
    /// metric.
    pub async fn send_metric(&self, metric: &Metric) -> Result<(), SendError> {
        let body = gzip(&serde_json::to_vec(metric)?)?;
        self.deliver(format!("{}/update/", self.base_url), body)
            .await
    }

    async fn deliver(&self, url: String, body: Vec<u8>) -> Result<(), SendError> {
        let mut last_err = None;
        for (attempt, backoff) in BACKOFF_SCHEDULE.iter().enumerate() {
            match self
                .client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .header(CONTENT_ENCODING, "gzip")
                .body(body.clone())
                .send()
                .await
            {
                Ok(response) => {
                    // The first response ends the cycle, its status is
                    // deliberately not inspected.
                    tracing::debug!(status = %response.status(), "report delivered");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "report attempt failed, backing off"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(*backoff).await;
                }
            }
        }
        // last_err is always set here: the schedule is nonempty and every
        // iteration either returned or stored an error.
        Err(SendError::Exhausted {
            attempts: BACKOFF_SCHEDULE.len(),
            source: last_err.expect("backoff schedule is nonempty"),
        })
    }
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
