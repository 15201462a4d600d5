// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hearth-files: the file service (C3) and search service (C4). Both
//! consult a [`MountRegistry`](hearth_vfs::MountRegistry) to translate
//! virtual paths before touching the [`FileSystem`](hearth_vfs::FileSystem).

pub mod mime;
pub mod search;
pub mod service;

pub use search::SearchService;
pub use service::FileService;
