//! Observability: composition telemetry (metrics) and sink abstractions.
//!
//! This module never inspects the interval graph directly.
//! Graph-level structure checks live in `graph::invariants`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport};
pub use sink::{
    CollapseKind, ComposeKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
