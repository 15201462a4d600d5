// SPDX-License-Identifier: MIT

//! Shared application state handed to every HTTP handler (spec.md §4.10),
//! mirroring the teacher's `ListenCtx` shared-context pattern.

use hearth_auth::AuthService;
use hearth_core::Clock;
use hearth_events::EventHub;
use hearth_files::{FileService, SearchService};
use hearth_jobs::JobScheduler;
use hearth_transfer::TransferEngine;
use hearth_vfs::{FileSystem, MountRegistry, StatProbe};
use std::collections::HashMap;
use std::sync::Arc;

use crate::admission::RateLimiter;

/// Everything a request handler needs, shared behind `Arc` across
/// connections. Generic over [`Clock`] so tests can substitute a
/// [`hearth_core::FakeClock`] without touching handler code.
pub struct AppState<C: Clock> {
    pub registry: Arc<MountRegistry>,
    pub fs: Arc<dyn FileSystem>,
    pub files: Arc<FileService>,
    pub search: Arc<SearchService>,
    pub transfer: Arc<TransferEngine<C>>,
    pub jobs: Arc<JobScheduler<C>>,
    pub events: Arc<EventHub>,
    pub auth: Arc<AuthService<C>>,
    pub stat_probe: Arc<dyn StatProbe>,
    pub display_names: HashMap<String, String>,
    pub login_limiter: Arc<RateLimiter>,
    pub allowed_origins: Vec<String>,
    pub clock: C,
}

pub type SharedState<C> = Arc<AppState<C>>;
