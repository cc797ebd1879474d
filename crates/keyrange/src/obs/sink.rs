//! Metrics sink boundary.
//!
//! Composition logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between range analysis
//! and the thread-local metrics state.
use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// ComposeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComposeKind {
    ListAnd,
    ListOr,
    TreeAnd,
    TreeOr,
}

///
/// CollapseKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CollapseKind {
    AlwaysTrue,
    Impossible,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Compose { kind: ComposeKind },
    ListCloned { intervals: u64 },
    BudgetExhausted { allocated: u64, limit: u64 },
    IndexMergeFallback,
    Collapsed { kind: CollapseKind },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// ThreadMetricsSink
/// Default sink that writes into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct ThreadMetricsSink;

impl MetricsSink for ThreadMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::Compose { kind } => match kind {
                ComposeKind::ListAnd => {
                    m.ops.list_and_calls = m.ops.list_and_calls.saturating_add(1);
                }
                ComposeKind::ListOr => {
                    m.ops.list_or_calls = m.ops.list_or_calls.saturating_add(1);
                }
                ComposeKind::TreeAnd => {
                    m.ops.tree_and_calls = m.ops.tree_and_calls.saturating_add(1);
                }
                ComposeKind::TreeOr => {
                    m.ops.tree_or_calls = m.ops.tree_or_calls.saturating_add(1);
                }
            },
            MetricsEvent::ListCloned { intervals } => {
                m.ops.lists_cloned = m.ops.lists_cloned.saturating_add(1);
                m.ops.intervals_cloned = m.ops.intervals_cloned.saturating_add(intervals);
            }
            MetricsEvent::BudgetExhausted { .. } => {
                m.ops.budget_exhaustions = m.ops.budget_exhaustions.saturating_add(1);
            }
            MetricsEvent::IndexMergeFallback => {
                m.ops.index_merge_fallbacks = m.ops.index_merge_fallbacks.saturating_add(1);
            }
            MetricsEvent::Collapsed { kind } => match kind {
                CollapseKind::AlwaysTrue => {
                    m.ops.collapsed_always_true = m.ops.collapsed_always_true.saturating_add(1);
                }
                CollapseKind::Impossible => {
                    m.ops.collapsed_impossible = m.ops.collapsed_impossible.saturating_add(1);
                }
            },
        });
    }
}

pub(crate) const THREAD_METRICS_SINK: ThreadMetricsSink = ThreadMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    match SINK_OVERRIDE.with(|cell| *cell.borrow()) {
        // SAFETY: the pointer is installed by `with_metrics_sink` from a live
        // shared borrow and cleared by its guard before that borrow ends, so
        // it is valid for this synchronous call. Only a shared reference is
        // formed.
        Some(sink) => unsafe { (*sink).record(event) },
        None => THREAD_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics counters for this thread.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics counters for this thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Route every event recorded while `f` runs to `sink`.
///
/// Overrides nest; the previous sink is restored on return and on unwind.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Restore(Option<*const dyn MetricsSink>);

    impl Drop for Restore {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = self.0);
        }
    }

    // SAFETY: only the lifetime is erased. `Restore` removes the pointer
    // before `sink` goes out of scope and `record` never keeps it.
    let erased = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(erased));
    let _restore = Restore(previous);

    f()
}
