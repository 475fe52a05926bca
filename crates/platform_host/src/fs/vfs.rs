//! In-memory virtual filesystem tree persisted as a single JSON blob.
//!
//! Every mutating operation serializes the whole tree to the configured [`KeyValueStore`] before
//! returning; [`VirtualFs::tick`] performs the same save on a fixed interval as a safety net.
//! Paths may be absolute or relative to the current directory.

use std::rc::Rc;

use log::{debug, warn};

use super::{
    node::{is_valid_basename, DirectoryNode, VfsNode},
    path::{is_same_or_descendant, join_child, resolve_virtual_path, segments, split_parent},
    seed::default_tree,
    types::{FsEntry, FsEntryKind, FsError, FsMetadata, VfsConfig},
};
use crate::{
    schedule::IntervalSchedule,
    storage::kv::{load_typed_with, save_typed_with, KeyValueStore, MemoryKeyValueStore},
    time::{Clock, SystemClock},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where the tree came from when the filesystem was loaded.
pub enum VfsBootSource {
    /// A well-formed persisted tree was restored.
    Restored,
    /// The default tree was synthesized (no data, or data was corrupt).
    Seeded,
}

/// Path-based virtual filesystem service.
pub struct VirtualFs {
    root: VfsNode,
    cwd: String,
    config: VfsConfig,
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    autosave: IntervalSchedule,
    boot_source: VfsBootSource,
}

impl VirtualFs {
    /// Loads the persisted tree from `store`, or seeds and persists the default tree when the
    /// stored blob is missing, malformed, or structurally invalid.
    pub fn load(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>, config: VfsConfig) -> Self {
        let restored = match load_typed_with::<_, VfsNode>(store.as_ref(), &config.storage_key) {
            Ok(Some(root)) if root.as_directory().is_some() && root.is_well_formed() => Some(root),
            Ok(Some(_)) => {
                warn!(
                    "persisted filesystem under `{}` is structurally invalid; reseeding",
                    config.storage_key
                );
                None
            }
            Ok(None) => {
                debug!("no persisted filesystem under `{}`", config.storage_key);
                None
            }
            Err(err) => {
                warn!(
                    "persisted filesystem under `{}` is corrupt ({err}); reseeding",
                    config.storage_key
                );
                None
            }
        };

        let now = clock.now_ms();
        let (root, boot_source) = match restored {
            Some(root) => (root, VfsBootSource::Restored),
            None => (
                default_tree(&config.home_directory, now),
                VfsBootSource::Seeded,
            ),
        };

        let mut fs = Self {
            root,
            cwd: "/".to_string(),
            autosave: IntervalSchedule::new(config.autosave_interval_ms),
            config,
            store,
            clock,
            boot_source,
        };
        fs.autosave.reset(now);

        let home = fs.resolve(&fs.config.home_directory);
        if matches!(fs.lookup(&home), Ok(VfsNode::Directory(_))) {
            fs.cwd = home;
        }

        if boot_source == VfsBootSource::Seeded {
            if let Err(err) = fs.persist() {
                warn!("persisting seeded filesystem failed: {err}");
            }
        }
        fs
    }

    /// Creates a filesystem over a fresh in-memory store and the system clock.
    pub fn in_memory() -> Self {
        Self::load(
            Rc::new(MemoryKeyValueStore::default()),
            Rc::new(SystemClock),
            VfsConfig::default(),
        )
    }

    /// Returns where the tree came from at load time.
    pub fn boot_source(&self) -> VfsBootSource {
        self.boot_source
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &VfsConfig {
        &self.config
    }

    /// Returns the root node.
    pub fn root(&self) -> &VfsNode {
        &self.root
    }

    /// Returns the current working directory.
    pub fn current_directory(&self) -> &str {
        &self.cwd
    }

    /// Changes the working directory used to resolve relative paths.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] or [`FsError::NotADirectory`] when `path` is not a directory.
    pub fn change_directory(&mut self, path: &str) -> Result<(), FsError> {
        let target = self.resolve(path);
        match self.lookup(&target)? {
            VfsNode::Directory(_) => {
                self.cwd = target;
                Ok(())
            }
            VfsNode::File(_) => Err(FsError::NotADirectory { path: target }),
        }
    }

    /// Normalizes `path`, resolving relative paths against the current directory.
    pub fn resolve(&self, path: &str) -> String {
        resolve_virtual_path(&self.cwd, path)
    }

    /// Returns `true` when `path` resolves to a node.
    pub fn exists(&self, path: &str) -> bool {
        self.lookup(&self.resolve(path)).is_ok()
    }

    /// Returns metadata for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] when the path does not resolve.
    pub fn stat(&self, path: &str) -> Result<FsMetadata, FsError> {
        let target = self.resolve(path);
        let node = self.lookup(&target)?;
        Ok(metadata_for(&target, node))
    }

    /// Lists the direct children of a directory in lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] or [`FsError::NotADirectory`].
    pub fn read_dir(&self, path: &str) -> Result<Vec<FsEntry>, FsError> {
        let target = self.resolve(path);
        let dir = expect_directory(self.lookup(&target)?, &target)?;
        Ok(dir
            .children
            .values()
            .map(|child| FsEntry {
                name: child.name().to_string(),
                path: join_child(&target, child.name()),
                kind: child.kind(),
                size: child.size(),
                created_at_unix_ms: child.created_at(),
                modified_at_unix_ms: child.modified_at(),
            })
            .collect())
    }

    /// Lists a directory with directories first, then lexicographic by name.
    ///
    /// # Errors
    ///
    /// Same as [`VirtualFs::read_dir`].
    pub fn list_directory_sorted(&self, path: &str) -> Result<Vec<FsEntry>, FsError> {
        let mut entries = self.read_dir(path)?;
        entries.sort_by(|a, b| {
            let rank = |kind: FsEntryKind| matches!(kind, FsEntryKind::File);
            rank(a.kind)
                .cmp(&rank(b.kind))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    /// Reads a file's content.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] or [`FsError::NotAFile`].
    pub fn read_file(&self, path: &str) -> Result<String, FsError> {
        let target = self.resolve(path);
        match self.lookup(&target)? {
            VfsNode::File(file) => Ok(file.content.clone()),
            VfsNode::Directory(_) => Err(FsError::NotAFile { path: target }),
        }
    }

    /// Creates an empty directory.
    ///
    /// # Errors
    ///
    /// Fails when the parent is missing or a file, or the basename is occupied.
    pub fn create_directory(&mut self, path: &str) -> Result<FsMetadata, FsError> {
        let target = self.resolve(path);
        let now = self.clock.now_ms();
        let (parent, name) = parent_for_insert(&mut self.root, &target)?;
        let node = VfsNode::directory(name, now);
        let metadata = metadata_for(&target, &node);
        parent.children.insert(name.to_string(), node);
        parent.modified_at = now;
        self.persist()?;
        Ok(metadata)
    }

    /// Creates a new file with `content`.
    ///
    /// # Errors
    ///
    /// Fails when the parent is missing or a file, or the basename is occupied.
    pub fn create_file(&mut self, path: &str, content: &str) -> Result<FsMetadata, FsError> {
        let target = self.resolve(path);
        let now = self.clock.now_ms();
        let (parent, name) = parent_for_insert(&mut self.root, &target)?;
        let node = VfsNode::file(name, content, now);
        let metadata = metadata_for(&target, &node);
        parent.children.insert(name.to_string(), node);
        parent.modified_at = now;
        self.persist()?;
        Ok(metadata)
    }

    /// Overwrites a file's content, creating the file when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotAFile`] for directories, otherwise the [`VirtualFs::create_file`]
    /// parent failures.
    pub fn write_file(&mut self, path: &str, content: &str) -> Result<FsMetadata, FsError> {
        self.update_file(path, content, false)
    }

    /// Appends to a file's content, creating the file when it does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`VirtualFs::write_file`].
    pub fn append_file(&mut self, path: &str, content: &str) -> Result<FsMetadata, FsError> {
        self.update_file(path, content, true)
    }

    /// Deletes a file.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] or [`FsError::NotAFile`].
    pub fn delete_file(&mut self, path: &str) -> Result<(), FsError> {
        let target = self.resolve(path);
        if let VfsNode::Directory(_) = self.lookup(&target)? {
            return Err(FsError::NotAFile { path: target });
        }
        self.detach(&target)?;
        self.persist()
    }

    /// Deletes a directory; `recursive` allows deleting one that still has children.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`], [`FsError::NotADirectory`], [`FsError::NotEmpty`], or
    /// [`FsError::InvalidTarget`] for the root.
    pub fn delete_directory(&mut self, path: &str, recursive: bool) -> Result<(), FsError> {
        let target = self.resolve(path);
        let dir = expect_directory(self.lookup(&target)?, &target)?;
        if target == "/" {
            return Err(FsError::InvalidTarget {
                path: target,
                reason: "cannot delete the root directory",
            });
        }
        if !recursive && !dir.children.is_empty() {
            return Err(FsError::NotEmpty { path: target });
        }
        self.detach(&target)?;
        if is_same_or_descendant(&target, &self.cwd) {
            let fallback = split_parent(&target)
                .map(|(parent, _)| parent.to_string())
                .unwrap_or_else(|| "/".to_string());
            self.cwd = fallback;
        }
        self.persist()
    }

    /// Moves (and optionally renames) a node to `dest`.
    ///
    /// # Errors
    ///
    /// Fails when `src` is missing, `dest`'s parent is missing or a file, `dest` is occupied, or
    /// a directory would be moved into its own subtree.
    pub fn move_file(&mut self, src: &str, dest: &str) -> Result<(), FsError> {
        let source = self.resolve(src);
        let target = self.resolve(dest);
        self.lookup(&source)?;
        if source == "/" {
            return Err(FsError::InvalidTarget {
                path: source,
                reason: "cannot move the root directory",
            });
        }
        self.check_insert_target(&target)?;
        if is_same_or_descendant(&source, &target) {
            return Err(FsError::InvalidTarget {
                path: target,
                reason: "cannot move a directory into itself",
            });
        }

        let now = self.clock.now_ms();
        let mut node = self.detach(&source)?;
        let (parent, name) = parent_for_insert(&mut self.root, &target)?;
        node.set_name(name);
        parent.children.insert(name.to_string(), node);
        parent.modified_at = now;

        if is_same_or_descendant(&source, &self.cwd) {
            self.cwd = format!("{target}{}", &self.cwd[source.len()..]);
        }
        self.persist()
    }

    /// Copies a node to `dest`. Directory copies include every descendant when `recursive`,
    /// otherwise only an empty directory is created.
    ///
    /// The copy is built completely before it is linked into the tree, so a failed copy leaves
    /// the tree unchanged.
    ///
    /// # Errors
    ///
    /// Fails when `src` is missing, `dest`'s parent is missing or a file, or `dest` is occupied.
    pub fn copy_file(&mut self, src: &str, dest: &str, recursive: bool) -> Result<(), FsError> {
        let source = self.resolve(src);
        let target = self.resolve(dest);
        let now = self.clock.now_ms();
        self.lookup(&source)?;
        self.check_insert_target(&target)?;
        let Some((_, name)) = split_parent(&target) else {
            return Err(root_target(target));
        };
        let copy = self.lookup(&source)?.duplicate(name, recursive, now);

        let (parent, name) = parent_for_insert(&mut self.root, &target)?;
        parent.children.insert(name.to_string(), copy);
        parent.modified_at = now;
        self.persist()
    }

    /// Finds nodes under `path` whose name, or (for files) content, contains `query`,
    /// ignoring case. Each matching path appears once, in depth-first lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] or [`FsError::NotADirectory`] for the starting path.
    pub fn search_files(
        &self,
        query: &str,
        path: &str,
        recursive: bool,
    ) -> Result<Vec<String>, FsError> {
        let start = self.resolve(path);
        let dir = expect_directory(self.lookup(&start)?, &start)?;
        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        collect_matches(dir, &start, &needle, recursive, &mut matches);
        Ok(matches)
    }

    /// Replaces the tree with the default seed tree and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Storage`] when persisting fails.
    pub fn reset(&mut self) -> Result<(), FsError> {
        self.root = default_tree(&self.config.home_directory, self.clock.now_ms());
        let home = self.resolve(&self.config.home_directory);
        self.cwd = if matches!(self.lookup(&home), Ok(VfsNode::Directory(_))) {
            home
        } else {
            "/".to_string()
        };
        self.persist()
    }

    /// Serializes the full tree to the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Storage`] when serialization or the write fails.
    pub fn persist(&self) -> Result<(), FsError> {
        save_typed_with(self.store.as_ref(), &self.config.storage_key, &self.root)?;
        Ok(())
    }

    /// Runs the periodic safety-net save when its interval has elapsed.
    ///
    /// Returns `true` when a save was performed.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Storage`] when the due save fails.
    pub fn tick(&mut self) -> Result<bool, FsError> {
        if !self.autosave.poll(self.clock.now_ms()) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn update_file(
        &mut self,
        path: &str,
        content: &str,
        append: bool,
    ) -> Result<FsMetadata, FsError> {
        let target = self.resolve(path);
        let existing = match self.lookup(&target) {
            Ok(node) => Some(node.kind()),
            Err(FsError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        match existing {
            None => return self.create_file(&target, content),
            Some(FsEntryKind::Directory) => return Err(FsError::NotAFile { path: target }),
            Some(FsEntryKind::File) => {}
        }

        let now = self.clock.now_ms();
        if let VfsNode::File(file) = lookup_mut(&mut self.root, &target)? {
            if append {
                file.content.push_str(content);
            } else {
                file.content = content.to_string();
            }
            file.modified_at = now;
        }
        self.persist()?;
        self.stat(&target)
    }

    fn lookup(&self, normalized: &str) -> Result<&VfsNode, FsError> {
        let mut current = &self.root;
        let mut walked = String::new();
        for segment in segments(normalized) {
            let VfsNode::Directory(dir) = current else {
                return Err(FsError::NotADirectory {
                    path: root_if_empty(walked),
                });
            };
            walked.push('/');
            walked.push_str(segment);
            current = dir.children.get(segment).ok_or_else(|| FsError::NotFound {
                path: normalized.to_string(),
            })?;
        }
        Ok(current)
    }

    fn check_insert_target(&self, target: &str) -> Result<(), FsError> {
        let Some((parent, name)) = split_parent(target) else {
            return Err(root_target(target.to_string()));
        };
        let dir = expect_directory(self.lookup(parent)?, parent)?;
        if !is_valid_basename(name) {
            return Err(FsError::InvalidTarget {
                path: target.to_string(),
                reason: "invalid file name",
            });
        }
        if dir.children.contains_key(name) {
            return Err(FsError::AlreadyExists {
                path: target.to_string(),
            });
        }
        Ok(())
    }

    fn detach(&mut self, target: &str) -> Result<VfsNode, FsError> {
        let Some((parent_path, name)) = split_parent(target) else {
            return Err(root_target(target.to_string()));
        };
        let now = self.clock.now_ms();
        let parent = lookup_mut(&mut self.root, parent_path)?
            .as_directory_mut()
            .ok_or_else(|| FsError::NotADirectory {
                path: parent_path.to_string(),
            })?;
        let node = parent
            .children
            .remove(name)
            .ok_or_else(|| FsError::NotFound {
                path: target.to_string(),
            })?;
        parent.modified_at = now;
        Ok(node)
    }
}

fn lookup_mut<'a>(root: &'a mut VfsNode, normalized: &str) -> Result<&'a mut VfsNode, FsError> {
    let mut current = root;
    let mut walked = String::new();
    for segment in segments(normalized) {
        let dir = match current {
            VfsNode::Directory(dir) => dir,
            VfsNode::File(_) => {
                return Err(FsError::NotADirectory {
                    path: root_if_empty(walked),
                })
            }
        };
        walked.push('/');
        walked.push_str(segment);
        current = dir
            .children
            .get_mut(segment)
            .ok_or_else(|| FsError::NotFound {
                path: normalized.to_string(),
            })?;
    }
    Ok(current)
}

/// Resolves the parent directory of `target` for inserting a new child, enforcing that the
/// parent exists, is a directory, and that the basename is free.
fn parent_for_insert<'a, 'p>(
    root: &'a mut VfsNode,
    target: &'p str,
) -> Result<(&'a mut DirectoryNode, &'p str), FsError> {
    let Some((parent_path, name)) = split_parent(target) else {
        return Err(root_target(target.to_string()));
    };
    if !is_valid_basename(name) {
        return Err(FsError::InvalidTarget {
            path: target.to_string(),
            reason: "invalid file name",
        });
    }
    let parent = match lookup_mut(root, parent_path) {
        Ok(VfsNode::Directory(dir)) => dir,
        Ok(VfsNode::File(_)) => {
            return Err(FsError::NotADirectory {
                path: parent_path.to_string(),
            })
        }
        Err(FsError::NotFound { .. }) => {
            return Err(FsError::NotFound {
                path: parent_path.to_string(),
            })
        }
        Err(err) => return Err(err),
    };
    if parent.children.contains_key(name) {
        return Err(FsError::AlreadyExists {
            path: target.to_string(),
        });
    }
    Ok((parent, name))
}

fn expect_directory<'a>(node: &'a VfsNode, path: &str) -> Result<&'a DirectoryNode, FsError> {
    node.as_directory().ok_or_else(|| FsError::NotADirectory {
        path: path.to_string(),
    })
}

fn metadata_for(path: &str, node: &VfsNode) -> FsMetadata {
    FsMetadata {
        name: node.name().to_string(),
        path: path.to_string(),
        kind: node.kind(),
        size: node.size(),
        child_count: node.as_directory().map(|dir| dir.children.len()),
        created_at_unix_ms: node.created_at(),
        modified_at_unix_ms: node.modified_at(),
    }
}

fn collect_matches(
    dir: &DirectoryNode,
    dir_path: &str,
    needle: &str,
    recursive: bool,
    out: &mut Vec<String>,
) {
    for child in dir.children.values() {
        let child_path = join_child(dir_path, child.name());
        let name_hit = child.name().to_lowercase().contains(needle);
        let content_hit = match child {
            VfsNode::File(file) => file.content.to_lowercase().contains(needle),
            VfsNode::Directory(_) => false,
        };
        if name_hit || content_hit {
            out.push(child_path.clone());
        }
        if let (true, VfsNode::Directory(sub)) = (recursive, child) {
            collect_matches(sub, &child_path, needle, recursive, out);
        }
    }
}

fn root_if_empty(walked: String) -> String {
    if walked.is_empty() {
        "/".to_string()
    } else {
        walked
    }
}

fn root_target(path: String) -> FsError {
    FsError::InvalidTarget {
        path,
        reason: "operation not permitted on the root directory",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::{storage::kv::StorageError, time::ManualClock};

    fn fs_with_clock(start_ms: u64) -> (VirtualFs, MemoryKeyValueStore, ManualClock) {
        let store = MemoryKeyValueStore::default();
        let clock = ManualClock::new(start_ms);
        let fs = VirtualFs::load(
            Rc::new(store.clone()),
            Rc::new(clock.clone()),
            VfsConfig::default(),
        );
        (fs, store, clock)
    }

    #[test]
    fn first_boot_seeds_and_persists_default_tree() {
        let (fs, store, _) = fs_with_clock(10);
        assert_eq!(fs.boot_source(), VfsBootSource::Seeded);
        assert_eq!(fs.current_directory(), "/home/user");
        assert!(store
            .load_raw(&fs.config().storage_key)
            .expect("load")
            .is_some());
    }

    #[test]
    fn reload_restores_persisted_tree() {
        let (mut fs, store, clock) = fs_with_clock(10);
        fs.create_file("/tmp/keep.txt", "kept").expect("create");

        let reloaded = VirtualFs::load(Rc::new(store), Rc::new(clock), VfsConfig::default());
        assert_eq!(reloaded.boot_source(), VfsBootSource::Restored);
        assert_eq!(reloaded.read_file("/tmp/keep.txt").expect("read"), "kept");
    }

    #[test]
    fn malformed_blob_falls_back_to_seed_tree() {
        let store = MemoryKeyValueStore::default();
        store
            .save_raw(&VfsConfig::default().storage_key, "{\"type\":\"file\"")
            .expect("save");
        let fs = VirtualFs::load(
            Rc::new(store),
            Rc::new(ManualClock::new(1)),
            VfsConfig::default(),
        );
        assert_eq!(fs.boot_source(), VfsBootSource::Seeded);
        assert!(fs.exists("/home/user/Documents"));
    }

    #[test]
    fn file_root_blob_is_treated_as_corrupt() {
        let store = MemoryKeyValueStore::default();
        save_typed_with(
            &store,
            &VfsConfig::default().storage_key,
            &VfsNode::file("x", "", 1),
        )
        .expect("save");
        let fs = VirtualFs::load(
            Rc::new(store),
            Rc::new(ManualClock::new(1)),
            VfsConfig::default(),
        );
        assert_eq!(fs.boot_source(), VfsBootSource::Seeded);
    }

    #[test]
    fn create_and_list_directory_scenario() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/home/docs").expect("mkdir");
        fs.create_file("/home/docs/a.txt", "hello").expect("create");

        let entries = fs.read_dir("/home/docs").expect("readdir");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].kind, FsEntryKind::File);
        assert_eq!(entries[0].size, Some(5));
    }

    #[test]
    fn move_relinks_node_and_updates_both_parents() {
        let (mut fs, _, clock) = fs_with_clock(1);
        fs.create_directory("/home/docs").expect("mkdir");
        fs.create_file("/home/docs/a.txt", "hello").expect("create");

        clock.set(500);
        fs.move_file("/home/docs/a.txt", "/home/b.txt").expect("move");

        assert!(!fs.exists("/home/docs/a.txt"));
        assert_eq!(fs.read_file("/home/b.txt").expect("read"), "hello");
        assert_eq!(fs.stat("/home/b.txt").expect("stat").name, "b.txt");
        assert_eq!(fs.stat("/home/docs").expect("stat").modified_at_unix_ms, 500);
        assert_eq!(fs.stat("/home").expect("stat").modified_at_unix_ms, 500);
    }

    #[test]
    fn create_reports_parent_and_occupancy_failures() {
        let (mut fs, _, _) = fs_with_clock(1);
        assert!(matches!(
            fs.create_file("/missing/a.txt", ""),
            Err(FsError::NotFound { path }) if path == "/missing"
        ));
        fs.create_file("/tmp/f", "").expect("create");
        assert!(matches!(
            fs.create_directory("/tmp/f/sub"),
            Err(FsError::NotADirectory { path }) if path == "/tmp/f"
        ));
        assert!(matches!(
            fs.create_directory("/tmp/f"),
            Err(FsError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn create_updates_parent_modified_time() {
        let (mut fs, _, clock) = fs_with_clock(1);
        clock.set(42);
        fs.create_directory("/tmp/new").expect("mkdir");
        assert_eq!(fs.stat("/tmp").expect("stat").modified_at_unix_ms, 42);
        assert_eq!(fs.stat("/tmp/new").expect("stat").created_at_unix_ms, 42);
    }

    #[test]
    fn read_file_rejects_directories_and_missing_paths() {
        let (fs, _, _) = fs_with_clock(1);
        assert!(matches!(fs.read_file("/tmp"), Err(FsError::NotAFile { .. })));
        assert!(matches!(
            fs.read_file("/tmp/none"),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn write_creates_then_overwrites_and_append_concatenates() {
        let (mut fs, _, clock) = fs_with_clock(1);
        fs.write_file("/tmp/log.txt", "one").expect("write");
        clock.set(99);
        fs.write_file("/tmp/log.txt", "two").expect("overwrite");
        let meta = fs.append_file("/tmp/log.txt", "+three").expect("append");
        assert_eq!(fs.read_file("/tmp/log.txt").expect("read"), "two+three");
        assert_eq!(meta.modified_at_unix_ms, 99);
        assert!(matches!(
            fs.write_file("/tmp", "x"),
            Err(FsError::NotAFile { .. })
        ));
        assert!(matches!(
            fs.write_file("/nope/x", "x"),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_file_then_absent() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_file("/tmp/gone.txt", "x").expect("create");
        fs.delete_file("/tmp/gone.txt").expect("delete");
        assert!(!fs.exists("/tmp/gone.txt"));
        assert!(matches!(
            fs.read_file("/tmp/gone.txt"),
            Err(FsError::NotFound { .. })
        ));
        assert!(matches!(
            fs.delete_file("/tmp"),
            Err(FsError::NotAFile { .. })
        ));
    }

    #[test]
    fn delete_directory_guards_non_empty_without_recursion() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/d").expect("mkdir");
        fs.create_file("/tmp/d/x", "").expect("create");
        assert!(matches!(
            fs.delete_directory("/tmp/d", false),
            Err(FsError::NotEmpty { .. })
        ));
        fs.delete_file("/tmp/d/x").expect("delete child");
        fs.delete_directory("/tmp/d", false).expect("delete empty");
        assert!(!fs.exists("/tmp/d"));
    }

    #[test]
    fn recursive_delete_moves_cwd_out_of_removed_subtree() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/d").expect("mkdir");
        fs.create_directory("/tmp/d/e").expect("mkdir");
        fs.change_directory("/tmp/d/e").expect("cd");
        fs.delete_directory("/tmp/d", true).expect("rm -r");
        assert_eq!(fs.current_directory(), "/tmp");
        assert!(matches!(
            fs.delete_directory("/", true),
            Err(FsError::InvalidTarget { .. })
        ));
        assert!(matches!(
            fs.delete_directory("/home/user/readme.txt", true),
            Err(FsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn move_rejects_occupied_destination_and_self_nesting() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/a").expect("mkdir");
        fs.create_file("/tmp/b", "").expect("create");
        assert!(matches!(
            fs.move_file("/tmp/a", "/tmp/b"),
            Err(FsError::AlreadyExists { .. })
        ));
        assert!(matches!(
            fs.move_file("/tmp/a", "/tmp/a/inner"),
            Err(FsError::InvalidTarget { .. })
        ));
        assert!(matches!(
            fs.move_file("/tmp/none", "/tmp/c"),
            Err(FsError::NotFound { .. })
        ));
        assert!(fs.exists("/tmp/a"));
    }

    #[test]
    fn move_rewrites_cwd_inside_moved_directory() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/a").expect("mkdir");
        fs.create_directory("/tmp/a/b").expect("mkdir");
        fs.change_directory("/tmp/a/b").expect("cd");
        fs.move_file("/tmp/a", "/tmp/z").expect("move");
        assert_eq!(fs.current_directory(), "/tmp/z/b");
    }

    #[test]
    fn copy_duplicates_subtree_or_empty_shell() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/src").expect("mkdir");
        fs.create_file("/tmp/src/a.txt", "alpha").expect("create");

        fs.copy_file("/tmp/src", "/tmp/deep", true).expect("copy -r");
        fs.copy_file("/tmp/src", "/tmp/shallow", false).expect("copy");
        fs.write_file("/tmp/src/a.txt", "changed").expect("write");

        assert_eq!(fs.read_file("/tmp/deep/a.txt").expect("read"), "alpha");
        assert!(fs.read_dir("/tmp/shallow").expect("readdir").is_empty());
        assert!(matches!(
            fs.copy_file("/tmp/src", "/tmp/deep", true),
            Err(FsError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn missing_source_wins_over_occupied_destination() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_file("/tmp/taken", "x").expect("create");
        assert!(matches!(
            fs.copy_file("/tmp/ghost", "/tmp/taken", false),
            Err(FsError::NotFound { .. })
        ));
        assert!(matches!(
            fs.move_file("/tmp/ghost", "/tmp/taken"),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn copy_into_own_subtree_takes_a_snapshot() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/src").expect("mkdir");
        fs.create_file("/tmp/src/a", "1").expect("create");
        fs.copy_file("/tmp/src", "/tmp/src/nested", true).expect("copy");
        assert_eq!(fs.read_file("/tmp/src/nested/a").expect("read"), "1");
        assert!(!fs.exists("/tmp/src/nested/nested"));
    }

    #[test]
    fn search_matches_names_and_content_once_each() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/s").expect("mkdir");
        fs.create_file("/tmp/s/Report.txt", "quarterly REPORT").expect("create");
        fs.create_directory("/tmp/s/sub").expect("mkdir");
        fs.create_file("/tmp/s/sub/notes", "see report").expect("create");

        let flat = fs.search_files("report", "/tmp/s", false).expect("search");
        assert_eq!(flat, vec!["/tmp/s/Report.txt".to_string()]);

        let deep = fs.search_files("REPORT", "/tmp/s", true).expect("search");
        assert_eq!(
            deep,
            vec!["/tmp/s/Report.txt".to_string(), "/tmp/s/sub/notes".to_string()]
        );
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.change_directory("/tmp").expect("cd");
        fs.create_file("rel.txt", "r").expect("create");
        assert_eq!(fs.read_file("/tmp/rel.txt").expect("read"), "r");
        fs.change_directory("..").expect("cd ..");
        assert_eq!(fs.current_directory(), "/");
        assert!(matches!(
            fs.change_directory("/home/user/readme.txt"),
            Err(FsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn list_directory_puts_directories_first() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.create_directory("/tmp/l").expect("mkdir");
        fs.create_file("/tmp/l/a.txt", "").expect("create");
        fs.create_directory("/tmp/l/z").expect("mkdir");
        let names = fs
            .list_directory_sorted("/tmp/l")
            .expect("list")
            .into_iter()
            .map(|entry| entry.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["z".to_string(), "a.txt".to_string()]);
    }

    #[test]
    fn tick_saves_only_when_interval_elapsed() {
        let (mut fs, store, clock) = fs_with_clock(0);
        store.delete_raw(&fs.config().storage_key).expect("clear");
        assert!(!fs.tick().expect("tick"));
        clock.advance(fs.config().autosave_interval_ms);
        assert!(fs.tick().expect("tick"));
        assert!(store
            .load_raw(&fs.config().storage_key)
            .expect("load")
            .is_some());
    }

    #[test]
    fn reset_restores_seed_tree() {
        let (mut fs, _, _) = fs_with_clock(1);
        fs.delete_directory("/home", true).expect("rm");
        fs.reset().expect("reset");
        assert!(fs.exists("/home/user/readme.txt"));
        assert_eq!(fs.current_directory(), "/home/user");
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn load_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn save_raw(&self, _key: &str, _raw_json: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_string()))
        }

        fn delete_raw(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn persist_failure_is_reported_to_the_caller() {
        let mut fs = VirtualFs::load(
            Rc::new(FailingStore),
            Rc::new(ManualClock::new(1)),
            VfsConfig::default(),
        );
        let err = fs.create_file("/tmp/x", "").expect_err("persist fails");
        assert!(matches!(err, FsError::Storage(_)));
    }

    proptest! {
        #[test]
        fn write_then_read_round_trips(
            name in "[A-Za-z0-9_-][A-Za-z0-9._-]{0,15}",
            content in ".*",
        ) {
            let (mut fs, _, _) = fs_with_clock(1);
            let path = format!("/tmp/{name}");
            fs.write_file(&path, &content).expect("write");
            prop_assert_eq!(fs.read_file(&path).expect("read"), content);
        }
    }
}
