// SPDX-License-Identifier: MIT

//! Decouples the scheduler from the event hub: `hearth-jobs` never depends
//! on `hearth-events` directly, it reports through this trait and the
//! binary wires the hub's broadcaster into it (spec.md §4.6 "broadcast via C7").

use hearth_core::Job;

/// Notified on every state or progress change (spec.md invariant: progress
/// broadcasts in non-decreasing order, terminal broadcast last).
pub trait JobObserver: Send + Sync {
    fn on_job_event(&self, job: &Job);
}

/// No-op observer, useful for tests that don't care about broadcasts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl JobObserver for NullObserver {
    fn on_job_event(&self, _job: &Job) {}
}
