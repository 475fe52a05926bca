//! Browser (`wasm32`) implementations of [`platform_host`] contracts.
//!
//! - [`WebLocalStorage`] persists the filesystem and session blobs in `window.localStorage`.
//! - [`IntervalHandle`] drives the auto-save timers from `window.setInterval`.
//!
//! On other targets both compile to inert implementations so host-side tests can link the
//! crate without a browser.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod storage;
pub mod timer;

pub use storage::local_storage::WebLocalStorage;
pub use timer::IntervalHandle;
