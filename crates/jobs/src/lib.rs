// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hearth-jobs: the background job scheduler (C6) — a fixed-size worker
//! pool draining a bounded queue, executing copy/move/delete with tracked
//! progress and cooperative cancellation.

pub mod observer;
pub mod ops;
pub mod scheduler;

pub use observer::JobObserver;
pub use scheduler::{JobParams, JobScheduler};
