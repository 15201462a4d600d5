// SPDX-License-Identifier: MIT

//! Background eviction of idle upload sessions (spec.md §4.5.2).

use crate::engine::TransferEngine;
use hearth_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs [`TransferEngine::sweep_idle`] on a fixed cadence until `shutdown` is
/// cancelled, mirroring the graceful-shutdown pattern used elsewhere in the
/// server (config/auth/jobs sweepers all follow the same shape).
pub async fn run<C: Clock>(
    engine: Arc<TransferEngine<C>>,
    interval: Duration,
    idle_timeout_ms: u64,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("upload session sweeper shutting down");
                return;
            }
            _ = ticker.tick() => {
                engine.sweep_idle(idle_timeout_ms).await;
            }
        }
    }
}
