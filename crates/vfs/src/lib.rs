// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hearth-vfs: mount registry, path validator, and the filesystem
//! abstraction that real and in-memory backends implement (spec.md C1, C2).

pub mod fs;
pub mod mem_fs;
pub mod os_fs;
pub mod registry;
pub mod statvfs;

pub use fs::{DirEntry, FileSystem, Metadata, ReadSeek};
pub use mem_fs::MemFs;
pub use os_fs::OsFs;
pub use registry::{MountRegistry, Resolved};
pub use statvfs::{DiskUsage, StatProbe};
