//! Typed host-domain contracts shared by the desktop runtime and browser adapters.
//!
//! This crate owns the persistence boundary ([`KeyValueStore`]), time sources ([`Clock`]),
//! interval scheduling for autosave, and the path-based [`VirtualFs`]. Concrete browser
//! adapters live in `platform_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod fs;
pub mod schedule;
pub mod storage;
pub mod time;

pub use fs::node::{DirectoryNode, FileNode, VfsNode};
pub use fs::path::{normalize_virtual_path, resolve_virtual_path};
pub use fs::seed::default_tree;
pub use fs::types::{
    FsEntry, FsEntryKind, FsError, FsMetadata, VfsConfig, DEFAULT_HOME_DIRECTORY,
    DEFAULT_VFS_AUTOSAVE_INTERVAL_MS, VFS_STORAGE_KEY,
};
pub use fs::vfs::{VfsBootSource, VirtualFs};
pub use schedule::IntervalSchedule;
pub use storage::kv::{
    load_typed_with, save_typed_with, KeyValueStore, MemoryKeyValueStore, NoopKeyValueStore,
    StorageError,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};
