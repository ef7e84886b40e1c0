use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters and simple perf totals for operations.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EventOps {
    // Executor entrypoints
    pub load_calls: u64,
    pub commit_calls: u64,

    // Rows touched
    pub rows_loaded: u64,
    pub rows_written: u64,
    pub rows_removed: u64,

    // Identity mapping
    pub identities_derived: u64,
    pub identity_rejections: u64,

    // Relations
    pub relations_attached: u64,
    pub relations_missing: u64,
    pub delete_blocks: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EntityCounters {
    pub load_calls: u64,
    pub rows_loaded: u64,
    pub identities_derived: u64,
    pub identity_rejections: u64,
    pub relations_attached: u64,
    pub delete_blocks: u64,
}

///
/// EventPerf
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EventPerf {
    pub load_micros_total: u128,
    pub commit_micros_total: u128,
    pub load_micros_max: u64,
    pub commit_micros_max: u64,
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
pub(crate) fn reset() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate elapsed time and track a max.
pub(crate) fn add_micros(total: &mut u128, max: &mut u64, delta: u64) {
    *total = total.saturating_add(u128::from(delta));
    if delta > *max {
        *max = delta;
    }
}
