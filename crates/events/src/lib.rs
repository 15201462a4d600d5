// SPDX-License-Identifier: MIT

//! Event channel (spec.md §4.7, C7): per-client subscriptions over a
//! bounded outbound queue, fed by job state changes from `hearth-jobs`.

pub mod client;
pub mod frame;
pub mod hub;

pub use client::{Client, OUTBOUND_QUEUE_CAPACITY};
pub use frame::{ErrorPayload, InboundFrame, JobUpdatePayload, OutboundFrame};
pub use hub::EventHub;
