//! FUSE daemon for the ZXDB game archive.
//!
//! The daemon splits into three layers:
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`options`] | Command-line configuration |
//! | [`status`] | Sources for the `/status` diagnostic files |
//! | [`adapter`] | Path-based filesystem operations over the core caches |
//! | [`shim`] | Inode bookkeeping and the actual [`fuser::Filesystem`] impl |
//!
//! The [`adapter`] knows nothing about inodes or file handles; it answers
//! `getattr`/`readdir`/`open` questions for string paths. The [`shim`]
//! owns the path-to-inode table and read buffers and translates kernel
//! callbacks into adapter calls.

pub mod adapter;
pub mod options;
pub mod shim;
pub mod status;

pub use adapter::ZxdbFs;
pub use options::Options;
pub use shim::ZxdbFuse;
