// SPDX-License-Identifier: MIT

//! Test-only builders, gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::job::{Job, JobType};
use crate::mount::MountPoint;
use crate::id::JobId;
use std::path::PathBuf;

/// Build a `MountPoint` for tests without repeating the constructor's plumbing.
pub fn mount(name: &str, path: impl Into<PathBuf>, read_only: bool) -> MountPoint {
    MountPoint::new(name, path.into(), read_only, false).expect("valid test mount")
}

/// Build a pending `Job` for tests.
pub fn job(job_type: JobType, source: &str, dest: Option<&str>) -> Job {
    Job::new(JobId::new(), job_type, source, dest.map(str::to_string), 0)
}
