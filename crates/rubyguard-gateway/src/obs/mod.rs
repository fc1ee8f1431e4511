//! Lightweight in-process metrics.
//!
//! Check outcomes are counted in atomics and rendered as Prometheus text by
//! the `/metrics` handler.

pub mod metrics;

pub use metrics::CheckMetrics;
