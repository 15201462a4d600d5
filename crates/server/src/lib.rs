// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hearth-server: the HTTP surface (C9, C10) that wires the mount registry,
//! file/search/transfer/job/event/auth services into a single `axum` app.

pub mod admission;
pub mod config;
pub mod headers;
pub mod http;
pub mod state;

pub use config::Config;
pub use http::router;
pub use state::{AppState, SharedState};
