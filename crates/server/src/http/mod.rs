// SPDX-License-Identifier: MIT

//! The HTTP surface (spec.md §4.10, C10): router assembly and the
//! per-concern handler modules.

pub mod auth;
pub mod error;
pub mod files;
pub mod health;
pub mod jobs;
pub mod search;
pub mod stream;
pub mod ws;

use crate::state::SharedState;
use axum::routing::{delete, get, post, put};
use axum::Router;
use hearth_core::Clock;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router. `C` is threaded through every handler
/// so tests can swap in a [`hearth_core::FakeClock`] without touching a
/// single route definition.
pub fn router<C: Clock>(state: SharedState<C>) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login::<C>))
        .route("/refresh", post(auth::refresh::<C>))
        .route("/logout", post(auth::logout::<C>));

    let file_routes = Router::new()
        .route("/", get(files::list_roots::<C>))
        .route("/{*path}", get(files::get_path::<C>))
        .route("/{*path}", post(files::create_dir::<C>))
        .route("/{*path}", put(files::rename::<C>))
        .route("/{*path}", delete(files::delete::<C>));

    let stream_routes = Router::new()
        .route("/download/{*path}", get(stream::download::<C>))
        .route("/preview/{*path}", get(stream::preview::<C>))
        .route("/upload/status", get(stream::upload_status::<C>))
        .route("/upload/{*path}", post(stream::upload_chunk::<C>));

    let job_routes = Router::new()
        .route("/", get(jobs::list_jobs::<C>))
        .route("/", post(jobs::create_job::<C>))
        .route("/{id}", get(jobs::get_job::<C>))
        .route("/{id}", delete(jobs::cancel_job::<C>));

    Router::new()
        .route("/health", get(health::health))
        .route("/ws", get(ws::upgrade::<C>))
        .route("/search", get(search::search::<C>))
        .nest("/auth", auth_routes)
        .nest("/files", file_routes)
        .nest("/stream", stream_routes)
        .nest("/jobs", job_routes)
        .layer(axum::middleware::from_fn(crate::headers::security_headers))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
