use serde::{Deserialize, Serialize};
use std::cell::RefCell;

///
/// EventState
/// Ephemeral, in-memory counters for composition activity on this thread.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Composition entrypoints
    pub list_and_calls: u64,
    pub list_or_calls: u64,
    pub tree_and_calls: u64,
    pub tree_or_calls: u64,

    // Copy-on-write
    pub lists_cloned: u64,
    pub intervals_cloned: u64,

    // Degradations
    pub budget_exhaustions: u64,
    pub index_merge_fallbacks: u64,
    pub collapsed_always_true: u64,
    pub collapsed_impossible: u64,
}

///
/// EventReport
/// Point-in-time snapshot of the thread-local counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Snapshot the current counters.
pub(crate) fn report() -> EventReport {
    with_state(|m| EventReport { ops: m.ops.clone() })
}
