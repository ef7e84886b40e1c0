//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! This module does not access storage internals directly.

pub mod metrics;
pub mod sink;


pub use metrics::EventState;
pub use sink::{
    ExecKind, MetricsEvent, MetricsSink, metrics_reset, metrics_snapshot, with_metrics_sink,
};
