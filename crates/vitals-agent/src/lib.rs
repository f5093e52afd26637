//! Agent process: samples runtime resource metrics on a poll timer,
//! accumulates them into a batch, and pushes the batch to the collector
//! on a report timer with bounded retry.

pub mod config;
pub mod sampler;
pub mod sender;
