//! Metrics sink boundary.
//!
//! Core DB logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between execution logic
//! and the global metrics state.
use crate::obs::metrics;
use std::{cell::Cell, time::Instant};

thread_local! {
    static SINK_OVERRIDE: Cell<Option<&'static dyn MetricsSink>> = const { Cell::new(None) };
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Load,
    Commit,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ExecStart {
        kind: ExecKind,
        entity_path: Option<&'static str>,
    },
    ExecFinish {
        kind: ExecKind,
        entity_path: Option<&'static str>,
        rows_touched: u64,
        elapsed_micros: u64,
    },
    IdentityDerived {
        entity_path: &'static str,
    },
    IdentityRejected {
        entity_path: &'static str,
    },
    RelationAttach {
        entity_path: &'static str,
        attached: u64,
        missing: u64,
    },
    DeleteBlocked {
        entity_path: &'static str,
    },
    CommitApplied {
        rows_written: u64,
        rows_removed: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ExecStart { kind, entity_path } => {
                metrics::with_state_mut(|m| {
                    match kind {
                        ExecKind::Load => m.ops.load_calls = m.ops.load_calls.saturating_add(1),
                        ExecKind::Commit => {
                            m.ops.commit_calls = m.ops.commit_calls.saturating_add(1);
                        }
                    }

                    if let Some(path) = entity_path {
                        let entry = m.entities.entry(path.to_string()).or_default();
                        if kind == ExecKind::Load {
                            entry.load_calls = entry.load_calls.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                entity_path,
                rows_touched,
                elapsed_micros,
            } => {
                metrics::with_state_mut(|m| {
                    match kind {
                        ExecKind::Load => {
                            m.ops.rows_loaded = m.ops.rows_loaded.saturating_add(rows_touched);
                            metrics::add_micros(
                                &mut m.perf.load_micros_total,
                                &mut m.perf.load_micros_max,
                                elapsed_micros,
                            );
                        }
                        ExecKind::Commit => {
                            metrics::add_micros(
                                &mut m.perf.commit_micros_total,
                                &mut m.perf.commit_micros_max,
                                elapsed_micros,
                            );
                        }
                    }

                    if let Some(path) = entity_path
                        && kind == ExecKind::Load
                    {
                        let entry = m.entities.entry(path.to_string()).or_default();
                        entry.rows_loaded = entry.rows_loaded.saturating_add(rows_touched);
                    }
                });
            }

            MetricsEvent::IdentityDerived { entity_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.identities_derived = m.ops.identities_derived.saturating_add(1);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.identities_derived = entry.identities_derived.saturating_add(1);
                });
            }

            MetricsEvent::IdentityRejected { entity_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.identity_rejections = m.ops.identity_rejections.saturating_add(1);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.identity_rejections = entry.identity_rejections.saturating_add(1);
                });
            }

            MetricsEvent::RelationAttach {
                entity_path,
                attached,
                missing,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.relations_attached = m.ops.relations_attached.saturating_add(attached);
                    m.ops.relations_missing = m.ops.relations_missing.saturating_add(missing);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.relations_attached = entry.relations_attached.saturating_add(attached);
                });
            }

            MetricsEvent::DeleteBlocked { entity_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.delete_blocks = m.ops.delete_blocks.saturating_add(1);
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.delete_blocks = entry.delete_blocks.saturating_add(1);
                });
            }

            MetricsEvent::CommitApplied {
                rows_written,
                rows_removed,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_written = m.ops.rows_written.saturating_add(rows_written);
                    m.ops.rows_removed = m.ops.rows_removed.saturating_add(rows_removed);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    match SINK_OVERRIDE.with(Cell::get) {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_snapshot() -> metrics::EventState {
    metrics::with_state(Clone::clone)
}

/// Reset all metrics state (counters + perf).
pub fn metrics_reset() {
    metrics::reset();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &'static dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<&'static dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| cell.set(self.0));
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.replace(Some(sink)));
    let _guard = Guard(prev);

    f()
}

/// Run a closure under `sink` when one is set.
pub(crate) fn with_optional_sink<T>(
    sink: Option<&'static dyn MetricsSink>,
    f: impl FnOnce() -> T,
) -> T {
    match sink {
        Some(sink) => with_metrics_sink(sink, f),
        None => f(),
    }
}

/// Span
/// RAII guard that emits start/finish metrics events for one executor call.
/// Ensures finish accounting happens even on unwind.

pub(crate) struct Span {
    kind: ExecKind,
    entity_path: Option<&'static str>,
    start: Instant,
    rows: u64,
}

impl Span {
    #[must_use]
    pub(crate) fn new(kind: ExecKind, entity_path: Option<&'static str>) -> Self {
        record(MetricsEvent::ExecStart { kind, entity_path });

        Self {
            kind,
            entity_path,
            start: Instant::now(),
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        let elapsed_micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            entity_path: self.entity_path,
            rows_touched: self.rows,
            elapsed_micros,
        });
    }
}
