//! Virtual filesystem core for zxdbfs.
//!
//! Everything here is mount-agnostic: the daemon crate adapts these pieces
//! to FUSE, but the core can be driven directly (and is, by the tests).
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`paths`] | Virtual path grammar: classification, title/id extraction, URL synthesis |
//! | [`cache`] | [`FsCache`]: path-keyed map of materialized [`VfsNode`] trees |
//! | [`fetch`] | [`Fetcher`] + [`UrlCache`]: memoized JSON/byte retrieval over HTTP or `file://` |
//! | [`byletter`] | Builds an index directory of game stubs from a by-letter response |
//! | [`game`] | Builds a full game subtree (release files, POKES/, SCRSHOT/) from a game response |
//! | [`search`] | Builds a search-result directory with score and term filtering |
//! | [`unstub`] | [`Unstubber`]: at-most-once expansion of a [`VfsNode::DirStub`] into its full tree |
//!
//! [`VfsNode`]: zxdbfs_types::VfsNode
//! [`VfsNode::DirStub`]: zxdbfs_types::VfsNode::DirStub
//! [`FsCache`]: cache::FsCache
//! [`UrlCache`]: fetch::UrlCache
//! [`Fetcher`]: fetch::Fetcher
//! [`Unstubber`]: unstub::Unstubber

pub mod byletter;
pub mod cache;
pub mod error;
pub mod fetch;
pub mod game;
pub mod paths;
pub mod search;
pub mod unstub;

pub use cache::FsCache;
pub use error::{Result, ZxdbError};
pub use fetch::{Fetcher, UrlCache};
pub use unstub::Unstubber;
