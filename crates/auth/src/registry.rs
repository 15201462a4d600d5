// SPDX-License-Identifier: MIT

//! Revocation registry for refresh credentials (spec.md §3 "revocation set
//! is process-local; expired entries are swept periodically", §4.8).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tracks refresh-token ids that are still live. A jti absent from the map
/// is either never-issued or already revoked/expired — both read as "not
/// live" to `is_live`.
#[derive(Default)]
pub struct RevocationRegistry {
    live: RwLock<HashMap<String, u64>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self { live: RwLock::new(HashMap::new()) }
    }

    /// Marks `jti` live until `expires_at_ms`, called when a refresh
    /// credential is issued.
    pub fn mark_live(&self, jti: String, expires_at_ms: u64) {
        self.live.write().insert(jti, expires_at_ms);
    }

    pub fn is_live(&self, jti: &str) -> bool {
        self.live.read().contains_key(jti)
    }

    /// Revokes `jti` immediately, called on logout and on every successful
    /// refresh (rotation invalidates the credential that was just used).
    pub fn revoke(&self, jti: &str) {
        self.live.write().remove(jti);
    }

    /// Drops entries past their natural expiry so the map doesn't grow
    /// unbounded over the life of the process.
    pub fn sweep(&self, now_ms: u64) {
        self.live.write().retain(|_, expires_at_ms| *expires_at_ms > now_ms);
    }

    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs [`RevocationRegistry::sweep`] on a fixed cadence until `shutdown` is
/// cancelled, mirroring the upload-session sweeper's shape.
pub async fn run_sweeper(
    registry: std::sync::Arc<RevocationRegistry>,
    clock: impl hearth_core::Clock,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("revocation sweeper shutting down");
                return;
            }
            _ = ticker.tick() => {
                registry.sweep(clock.epoch_ms());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_jti_is_live_until_revoked() {
        let registry = RevocationRegistry::new();
        registry.mark_live("refresh-1".into(), 10_000);
        assert!(registry.is_live("refresh-1"));
        registry.revoke("refresh-1");
        assert!(!registry.is_live("refresh-1"));
    }

    #[test]
    fn unknown_jti_is_not_live() {
        let registry = RevocationRegistry::new();
        assert!(!registry.is_live("never-issued"));
    }

    #[test]
    fn sweep_drops_entries_past_expiry() {
        let registry = RevocationRegistry::new();
        registry.mark_live("refresh-1".into(), 1_000);
        registry.mark_live("refresh-2".into(), 5_000);
        registry.sweep(2_000);
        assert!(!registry.is_live("refresh-1"));
        assert!(registry.is_live("refresh-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_promptly_on_shutdown() {
        let registry = std::sync::Arc::new(RevocationRegistry::new());
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let handle = tokio::spawn(run_sweeper(
            registry,
            hearth_core::FakeClock::new(),
            Duration::from_secs(60),
            shutdown,
        ));
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
