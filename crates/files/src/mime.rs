// SPDX-License-Identifier: MIT

//! Extension -> MIME type derivation (spec.md §4.5.1).

/// Best-effort MIME type from a file name's extension. Falls back to
/// `application/octet-stream` for unknown or missing extensions.
pub fn guess(name: &str) -> String {
    mime_guess::from_path(name).first_or_octet_stream().essence_str().to_string()
}
