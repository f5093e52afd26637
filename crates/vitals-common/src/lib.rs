//! Shared metric model for the vitals agent and server.
//!
//! Both processes speak the same wire form: a [`types::Metric`] carries an
//! ID, a kind, and exactly one numeric payload depending on that kind.

pub mod types;

pub use types::{Metric, MetricKind, UnsupportedKind};
