//! Virtual filesystem data types shared across host contracts and consumers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::kv::StorageError;

/// Storage key under which the persisted filesystem tree lives.
pub const VFS_STORAGE_KEY: &str = "webdesk.vfs.v1";
/// Default interval for the safety-net filesystem save.
pub const DEFAULT_VFS_AUTOSAVE_INTERVAL_MS: u64 = 60_000;
/// Default working directory and home path.
pub const DEFAULT_HOME_DIRECTORY: &str = "/home/user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Directory entry kind.
pub enum FsEntryKind {
    /// File entry.
    File,
    /// Directory entry.
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Directory entry returned by listing operations.
pub struct FsEntry {
    /// Base name of the entry.
    pub name: String,
    /// Full normalized path.
    pub path: String,
    /// File or directory kind.
    pub kind: FsEntryKind,
    /// Content size in bytes (files only).
    pub size: Option<u64>,
    /// Creation time in unix milliseconds.
    pub created_at_unix_ms: u64,
    /// Last-modified time in unix milliseconds.
    pub modified_at_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Metadata describing a single path.
pub struct FsMetadata {
    /// Base name of the path (empty for the root).
    pub name: String,
    /// Full normalized path.
    pub path: String,
    /// File or directory kind.
    pub kind: FsEntryKind,
    /// Content size in bytes (files only).
    pub size: Option<u64>,
    /// Number of direct children (directories only).
    pub child_count: Option<usize>,
    /// Creation time in unix milliseconds.
    pub created_at_unix_ms: u64,
    /// Last-modified time in unix milliseconds.
    pub modified_at_unix_ms: u64,
}

#[derive(Debug, Error)]
/// Errors returned by virtual filesystem operations.
///
/// The display form names the failing path and the reason so callers can surface it directly.
pub enum FsError {
    /// The path does not resolve to any node.
    #[error("{path}: no such file or directory")]
    NotFound {
        /// Normalized path that failed to resolve.
        path: String,
    },
    /// The path resolves to a file where a directory was required.
    #[error("{path}: not a directory")]
    NotADirectory {
        /// Normalized path of the offending node.
        path: String,
    },
    /// The path resolves to a directory where a file was required.
    #[error("{path}: not a file")]
    NotAFile {
        /// Normalized path of the offending node.
        path: String,
    },
    /// The target basename is already occupied.
    #[error("{path}: already exists")]
    AlreadyExists {
        /// Normalized path that is already occupied.
        path: String,
    },
    /// A non-recursive delete targeted a directory with children.
    #[error("{path}: directory not empty")]
    NotEmpty {
        /// Normalized path of the non-empty directory.
        path: String,
    },
    /// The operation cannot apply to this target (the root, or a directory moved into itself).
    #[error("{path}: {reason}")]
    InvalidTarget {
        /// Normalized path of the rejected target.
        path: String,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// The mutation was applied in memory but persisting the tree failed.
    #[error("failed to persist filesystem: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Filesystem persistence and boot settings.
pub struct VfsConfig {
    /// Storage key for the serialized tree.
    pub storage_key: String,
    /// Interval of the safety-net save performed by [`crate::VirtualFs::tick`].
    pub autosave_interval_ms: u64,
    /// Initial working directory, created by the default seed tree.
    pub home_directory: String,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            storage_key: VFS_STORAGE_KEY.to_string(),
            autosave_interval_ms: DEFAULT_VFS_AUTOSAVE_INTERVAL_MS,
            home_directory: DEFAULT_HOME_DIRECTORY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn entry_kind_serde_values_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&FsEntryKind::Directory).expect("serialize"),
            "\"directory\""
        );
        let kind: FsEntryKind = serde_json::from_str("\"file\"").expect("deserialize");
        assert_eq!(kind, FsEntryKind::File);
    }

    #[test]
    fn error_messages_name_the_path_and_reason() {
        let err = FsError::NotEmpty {
            path: "/home/docs".to_string(),
        };
        assert_eq!(err.to_string(), "/home/docs: directory not empty");
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: VfsConfig =
            serde_json::from_str(r#"{"home_directory":"/home/guest"}"#).expect("config");
        assert_eq!(config.home_directory, "/home/guest");
        assert_eq!(config.storage_key, VFS_STORAGE_KEY);
    }
}
