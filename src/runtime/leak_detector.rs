//! Allocation counters for the reference-counted runtime objects whose
//! lifetimes are easy to get wrong: model adapters (self-referencing until
//! teardown) and component instances (captured by callback handlers).

use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeakStats {
    pub adapters_created: usize,
    pub adapters_torn_down: usize,
    pub instances_created: usize,
    pub instances_dropped: usize,
}

impl LeakStats {
    pub fn live_adapters(&self) -> usize {
        self.adapters_created - self.adapters_torn_down
    }

    pub fn live_instances(&self) -> usize {
        self.instances_created - self.instances_dropped
    }
}

// Runtime objects never leave their creating thread; counts are per thread.
thread_local! {
    static STATS: Cell<LeakStats> = Cell::new(LeakStats::default());
}

fn update(f: impl FnOnce(&mut LeakStats)) {
    STATS.with(|stats| {
        let mut current = stats.get();
        f(&mut current);
        stats.set(current);
    });
}

pub fn record_adapter_created() {
    update(|s| s.adapters_created += 1);
}

pub fn record_adapter_torn_down() {
    update(|s| s.adapters_torn_down += 1);
}

pub fn record_instance_created() {
    update(|s| s.instances_created += 1);
}

pub fn record_instance_dropped() {
    update(|s| s.instances_dropped += 1);
}

pub fn snapshot() -> LeakStats {
    STATS.with(Cell::get)
}
