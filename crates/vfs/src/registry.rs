// SPDX-License-Identifier: MIT

//! Mount registry and path resolver (spec.md §4.1, C1).
//!
//! A virtual path looks like `<mount>/<rest>`. Resolution percent-decodes
//! the path, splits off the mount name, then lexically collapses `.` and
//! `..` components against the mount's root — deliberately not
//! `std::fs::canonicalize`, which requires the target to exist and would
//! break resolving not-yet-created upload destinations.

use hearth_core::{Error, MountPoint, Result};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// A virtual path resolved to its owning mount and absolute host path.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub mount: MountPoint,
    pub host_path: PathBuf,
}

/// The set of configured mounts, immutable after startup.
#[derive(Debug, Clone)]
pub struct MountRegistry {
    mounts: Vec<MountPoint>,
}

impl MountRegistry {
    pub fn new(mounts: Vec<MountPoint>) -> Result<Self> {
        hearth_core::mount::assert_unique_names(&mounts)?;
        Ok(Self { mounts })
    }

    pub fn list_mounts(&self) -> &[MountPoint] {
        &self.mounts
    }

    fn find(&self, name: &str) -> Option<&MountPoint> {
        self.mounts.iter().find(|m| m.name() == name)
    }

    /// Resolve a virtual path of the form `<mount>[/<rest>]` to a host path.
    /// Rejects traversal out of the mount root and, when `require_write` is
    /// set, rejects resolution against a read-only mount.
    pub fn resolve(&self, virtual_path: &str, require_write: bool) -> Result<Resolved> {
        let decoded = percent_decode_str(virtual_path)
            .decode_utf8()
            .map_err(|_| Error::Validation("path is not valid UTF-8".into()))?;
        if decoded.contains('\0') {
            return Err(Error::Validation("path must not contain NUL".into()));
        }
        let trimmed = decoded.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::Validation("path must include a mount name".into()));
        }

        let mut parts = trimmed.splitn(2, '/');
        let mount_name = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("");

        if mount_name.is_empty() {
            return Err(Error::Validation("mount name must not be empty".into()));
        }
        let mount = self
            .find(mount_name)
            .ok_or_else(|| Error::MountNotFound(mount_name.to_string()))?;

        if require_write && mount.read_only() {
            return Err(Error::ReadOnly(mount_name.to_string()));
        }

        let host_path = normalize_within(mount.path(), rest)?;
        Ok(Resolved { mount: mount.clone(), host_path })
    }
}

/// Lexically join `rest` onto `root`, rejecting any `..` that would climb
/// above `root`. No filesystem access — `rest` need not exist.
fn normalize_within(root: &Path, rest: &str) -> Result<PathBuf> {
    let mut stack: Vec<std::ffi::OsString> = root.iter().map(|c| c.to_os_string()).collect();
    let boundary = stack.len();

    for component in rest.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if stack.len() <= boundary {
                    return Err(Error::PathTraversal(rest.to_string()));
                }
                stack.pop();
            }
            other => stack.push(other.into()),
        }
    }

    let mut result = PathBuf::new();
    for part in stack {
        result.push(part);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MountRegistry {
        let media = MountPoint::new("media", PathBuf::from("/data/media"), false, false).unwrap();
        let backups = MountPoint::new("backups", PathBuf::from("/data/backups"), true, false).unwrap();
        MountRegistry::new(vec![media, backups]).unwrap()
    }

    #[test]
    fn resolves_simple_path() {
        let reg = registry();
        let resolved = reg.resolve("media/photos/a.jpg", false).unwrap();
        assert_eq!(resolved.host_path, PathBuf::from("/data/media/photos/a.jpg"));
    }

    #[test]
    fn resolves_bare_mount_name() {
        let reg = registry();
        let resolved = reg.resolve("media", false).unwrap();
        assert_eq!(resolved.host_path, PathBuf::from("/data/media"));
    }

    #[test]
    fn collapses_dot_dot_within_bounds() {
        let reg = registry();
        let resolved = reg.resolve("media/a/../b.jpg", false).unwrap();
        assert_eq!(resolved.host_path, PathBuf::from("/data/media/b.jpg"));
    }

    #[test]
    fn rejects_escape_above_mount_root() {
        let reg = registry();
        let err = reg.resolve("media/../../etc/passwd", false).unwrap_err();
        assert_eq!(err.code(), "path_traversal");
    }

    #[test]
    fn rejects_unknown_mount() {
        let reg = registry();
        let err = reg.resolve("nope/a.txt", false).unwrap_err();
        assert_eq!(err.code(), "mount_not_found");
    }

    #[test]
    fn rejects_write_against_read_only_mount() {
        let reg = registry();
        let err = reg.resolve("backups/a.txt", true).unwrap_err();
        assert_eq!(err.code(), "read_only");
    }

    #[test]
    fn allows_read_against_read_only_mount() {
        let reg = registry();
        assert!(reg.resolve("backups/a.txt", false).is_ok());
    }

    #[test]
    fn rejects_embedded_nul() {
        let reg = registry();
        let err = reg.resolve("media/a%00b.txt", false).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn decodes_percent_encoded_segments() {
        let reg = registry();
        let resolved = reg.resolve("media/a%20b.txt", false).unwrap();
        assert_eq!(resolved.host_path, PathBuf::from("/data/media/a b.txt"));
    }
}
