use serde::{Deserialize, Serialize};

/// Error returned when a metric kind string is neither `gauge` nor
/// `counter`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported metric kind: {0}")]
pub struct UnsupportedKind(pub String);

/// The two metric kinds.
///
/// A counter accumulates: every update adds its delta to the stored value.
/// A gauge replaces: every update overwrites the stored value. Once a
/// metric ID exists under one kind it may never be updated under the other.
///
/// # Examples
///
/// ```
/// use vitals_common::types::MetricKind;
///
/// let kind: MetricKind = "counter".parse().unwrap();
/// assert_eq!(kind, MetricKind::Counter);
/// assert_eq!(kind.to_string(), "counter");
/// assert!("histogram".parse::<MetricKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Gauge => write!(f, "gauge"),
            MetricKind::Counter => write!(f, "counter"),
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            _ => Err(UnsupportedKind(s.to_string())),
        }
    }
}

/// One metric update or reading.
///
/// On the wire this is `{"id", "type", "delta"?, "value"?}` with exactly
/// one of `delta`/`value` present: `delta` for counters, `value` for
/// gauges. The unused field is omitted, never serialized as null.
///
/// # Examples
///
/// ```
/// use vitals_common::types::Metric;
///
/// let m = Metric::counter("requests", 3);
/// assert_eq!(m.value_string().as_deref(), Some("3"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Metric {
    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Counter,
            delta: Some(delta),
            value: None,
        }
    }

    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Gauge,
            delta: None,
            value: Some(value),
        }
    }

    /// Textual form of the payload: a decimal integer for counters, the
    /// shortest round-trippable decimal for gauges. `None` when the
    /// payload matching the kind is absent.
    pub fn value_string(&self) -> Option<String> {
        match self.kind {
            MetricKind::Counter => self.delta.map(|d| d.to_string()),
            MetricKind::Gauge => self.value.map(|v| v.to_string()),
        }
    }
}
