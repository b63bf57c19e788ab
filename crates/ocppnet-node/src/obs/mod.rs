//! Lightweight in-process metrics (dependency-free).
//!
//! Forwarding outcomes, decode errors and subscriber faults are stored as
//! atomics and rendered in Prometheus text format on demand.

pub mod metrics;

pub use metrics::NodeMetrics;
