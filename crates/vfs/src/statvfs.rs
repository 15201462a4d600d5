// SPDX-License-Identifier: MIT

//! Disk-usage probing for mounts (SPEC_FULL.md supplemental feature:
//! surfacing free/total space alongside mount listings, the way a homelab
//! dashboard would).

use std::path::Path;

/// Free/total space for a single mount, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Abstraction over `statvfs(2)` so tests don't need a real filesystem with
/// known free space.
pub trait StatProbe: Send + Sync {
    fn usage(&self, path: &Path) -> hearth_core::Result<DiskUsage>;
}

/// Real probe, backed by `rustix::fs::statvfs` on Unix.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsStatProbe;

#[cfg(unix)]
impl StatProbe for OsStatProbe {
    fn usage(&self, path: &Path) -> hearth_core::Result<DiskUsage> {
        let stats = rustix::fs::statvfs(path).map_err(|err| {
            hearth_core::Error::internal(format!("statvfs({}) failed: {err}", path.display()))
        })?;
        let block_size = stats.f_frsize;
        Ok(DiskUsage {
            total_bytes: stats.f_blocks.saturating_mul(block_size),
            free_bytes: stats.f_bavail.saturating_mul(block_size),
        })
    }
}

#[cfg(not(unix))]
impl StatProbe for OsStatProbe {
    fn usage(&self, _path: &Path) -> hearth_core::Result<DiskUsage> {
        Err(hearth_core::Error::internal("disk usage probing is only supported on unix"))
    }
}

/// A fixed-answer probe for tests.
#[derive(Debug, Clone, Copy)]
pub struct FakeStatProbe {
    pub usage: DiskUsage,
}

impl StatProbe for FakeStatProbe {
    fn usage(&self, _path: &Path) -> hearth_core::Result<DiskUsage> {
        Ok(self.usage)
    }
}
