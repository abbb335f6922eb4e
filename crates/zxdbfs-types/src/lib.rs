//! Shared data model for zxdbfs.
//!
//! This crate is the leaf of the workspace: the virtual-node tree type that
//! the cache and the builders exchange, the validated ZXDB game id, and the
//! diagnostic status report served through the magic `/status` files. It has
//! **no internal zxdbfs dependencies** — core and daemon both build on it.
//!
//! # Key Types
//!
//! |----------------|-----------------------------------------------------|
//! | Type           | Purpose                                             |
//! |----------------|-----------------------------------------------------|
//! | [`VfsNode`]    | One node of the synthesized tree (dir/file/stub)    |
//! | [`NodeError`]  | Illegal tree mutations (e.g. child under a file)    |
//! | [`GameId`]     | Validated 7-digit ZXDB identifier                   |
//! | [`StatusReport`] | Parsed Wi-Fi / time-sync / process diagnostics    |
//! |----------------|-----------------------------------------------------|

pub mod gameid;
pub mod node;
pub mod status;

pub use gameid::{GameId, GameIdError};
pub use node::{NodeError, VfsNode};
pub use status::{StatusError, StatusReport, WifiStatus};
