//! Virtual filesystem: path helpers, tree nodes, the seed tree, and the [`vfs::VirtualFs`]
//! service.

pub mod node;
pub mod path;
pub mod seed;
pub mod types;
pub mod vfs;
