// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hearth-transfer: the transfer engine (C5) — range-aware download and
//! resumable chunked upload, with an idle-timeout session sweeper.

pub mod download;
pub mod engine;
pub mod range;
pub mod sweeper;
pub mod upload;

pub use download::{Disposition, DownloadResult};
pub use engine::TransferEngine;
pub use range::ContentRange;
pub use upload::{ChunkRequest, UploadSession, UploadStatus};
