//! Tree node types for the virtual filesystem and their persisted JSON shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::FsEntryKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
/// A node in the virtual filesystem tree.
///
/// Directories own their children, so every node except the root has exactly one parent and the
/// structure cannot contain cycles.
pub enum VfsNode {
    /// Directory node owning its children by basename.
    Directory(DirectoryNode),
    /// Text file node.
    File(FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Directory payload.
pub struct DirectoryNode {
    /// Basename of the directory (empty for the root).
    pub name: String,
    /// Children keyed by basename.
    #[serde(default)]
    pub children: BTreeMap<String, VfsNode>,
    /// Creation time in unix milliseconds.
    pub created_at: u64,
    /// Last-modified time in unix milliseconds.
    pub modified_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// File payload.
pub struct FileNode {
    /// Basename of the file.
    pub name: String,
    /// UTF-8 text content.
    #[serde(default)]
    pub content: String,
    /// Creation time in unix milliseconds.
    pub created_at: u64,
    /// Last-modified time in unix milliseconds.
    pub modified_at: u64,
}

impl VfsNode {
    /// Creates an empty directory node stamped at `now_ms`.
    pub fn directory(name: impl Into<String>, now_ms: u64) -> Self {
        Self::Directory(DirectoryNode {
            name: name.into(),
            children: BTreeMap::new(),
            created_at: now_ms,
            modified_at: now_ms,
        })
    }

    /// Creates a file node stamped at `now_ms`.
    pub fn file(name: impl Into<String>, content: impl Into<String>, now_ms: u64) -> Self {
        Self::File(FileNode {
            name: name.into(),
            content: content.into(),
            created_at: now_ms,
            modified_at: now_ms,
        })
    }

    /// Returns the node basename.
    pub fn name(&self) -> &str {
        match self {
            Self::Directory(dir) => &dir.name,
            Self::File(file) => &file.name,
        }
    }

    /// Renames the node.
    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Self::Directory(dir) => dir.name = name.into(),
            Self::File(file) => file.name = name.into(),
        }
    }

    /// Returns the node kind.
    pub fn kind(&self) -> FsEntryKind {
        match self {
            Self::Directory(_) => FsEntryKind::Directory,
            Self::File(_) => FsEntryKind::File,
        }
    }

    /// Returns the content length in bytes for files, `None` for directories.
    pub fn size(&self) -> Option<u64> {
        match self {
            Self::Directory(_) => None,
            Self::File(file) => Some(file.content.len() as u64),
        }
    }

    /// Returns the creation time in unix milliseconds.
    pub fn created_at(&self) -> u64 {
        match self {
            Self::Directory(dir) => dir.created_at,
            Self::File(file) => file.created_at,
        }
    }

    /// Returns the last-modified time in unix milliseconds.
    pub fn modified_at(&self) -> u64 {
        match self {
            Self::Directory(dir) => dir.modified_at,
            Self::File(file) => file.modified_at,
        }
    }

    /// Updates the last-modified time.
    pub fn touch(&mut self, now_ms: u64) {
        match self {
            Self::Directory(dir) => dir.modified_at = now_ms,
            Self::File(file) => file.modified_at = now_ms,
        }
    }

    /// Returns the directory payload when this node is a directory.
    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    /// Returns the mutable directory payload when this node is a directory.
    pub fn as_directory_mut(&mut self) -> Option<&mut DirectoryNode> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    /// Returns a copy of this node: the full subtree when `recursive`, otherwise an empty
    /// directory shell (files are always copied with their content). The copy is renamed to
    /// `name` and stamped at `now_ms`.
    pub fn duplicate(&self, name: &str, recursive: bool, now_ms: u64) -> Self {
        match self {
            Self::File(file) => Self::file(name, file.content.clone(), now_ms),
            Self::Directory(dir) => {
                let mut shell = DirectoryNode {
                    name: name.to_string(),
                    children: BTreeMap::new(),
                    created_at: now_ms,
                    modified_at: now_ms,
                };
                if recursive {
                    for (child_name, child) in &dir.children {
                        shell
                            .children
                            .insert(child_name.clone(), child.duplicate(child_name, true, now_ms));
                    }
                }
                Self::Directory(shell)
            }
        }
    }

    /// Checks that every child key is a valid basename matching the child's own name.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::File(_) => true,
            Self::Directory(dir) => dir.children.iter().all(|(key, child)| {
                is_valid_basename(key) && child.name() == key && child.is_well_formed()
            }),
        }
    }
}

/// Returns `true` when `name` can name a directory entry.
pub fn is_valid_basename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}
