//! Inode bookkeeping and the [`fuser::Filesystem`] implementation.
//!
//! The kernel speaks inodes; the [`adapter`](crate::adapter) speaks paths.
//! [`InodeTable`] is the bridge: a bidirectional map that assigns an inode
//! to every path the kernel has seen, with the mount root pinned at 1.
//! Opening a file downloads its full body into a per-handle buffer and
//! `read` serves windows out of it, which matches how the archive hosts
//! behave (no reliable range requests) and keeps `read` infallible.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use fuser::{FileType, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, Request};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use zxdbfs_core::ZxdbError;

use crate::adapter::{DirEntry, EntryKind, FileInfo, ZxdbFs};

/// How long the kernel may cache attributes and entries. Game metadata
/// is effectively immutable, but the cache-control paths have side
/// effects on `stat`, so keep this short.
pub const TTL: Duration = Duration::from_secs(1);

pub const ROOT_INO: u64 = 1;

/// Bidirectional path-to-inode map.
#[derive(Debug)]
pub struct InodeTable {
    by_ino: HashMap<u64, String>,
    by_path: HashMap<String, u64>,
    next: u64,
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = Self {
            by_ino: HashMap::new(),
            by_path: HashMap::new(),
            next: ROOT_INO + 1,
        };
        table.by_ino.insert(ROOT_INO, "/".to_string());
        table.by_path.insert("/".to_string(), ROOT_INO);
        table
    }

    /// Inode for `path`, allocating one on first sight.
    pub fn ino_for(&mut self, path: &str) -> u64 {
        if let Some(&ino) = self.by_path.get(path) {
            return ino;
        }
        let ino = self.next;
        self.next += 1;
        self.by_ino.insert(ino, path.to_string());
        self.by_path.insert(path.to_string(), ino);
        trace!(path, ino, "assigned inode");
        ino
    }

    pub fn path_of(&self, ino: u64) -> Option<&str> {
        self.by_ino.get(&ino).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_ino.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ino.is_empty()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Join a parent path and a child name.
fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// The byte window `read` should answer with.
fn read_window(buf: &[u8], offset: i64, size: u32) -> &[u8] {
    let offset = offset.max(0) as usize;
    if offset >= buf.len() {
        return &[];
    }
    let end = buf.len().min(offset + size as usize);
    &buf[offset..end]
}

fn errno_for(err: &ZxdbError) -> i32 {
    match err {
        ZxdbError::Http { status: 400, .. } => libc::EINTR,
        ZxdbError::Http { .. } => libc::ENOENT,
        ZxdbError::Transport(_) => libc::EIO,
        ZxdbError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => libc::ENOENT,
        ZxdbError::Io(_) => libc::EIO,
        _ => libc::ENOENT,
    }
}

pub struct ZxdbFuse {
    fs: ZxdbFs,
    inodes: Mutex<InodeTable>,
    handles: Mutex<HashMap<u64, Vec<u8>>>,
    next_fh: AtomicU64,
    uid: u32,
    gid: u32,
}

impl ZxdbFuse {
    pub fn new(fs: ZxdbFs) -> Self {
        Self {
            fs,
            inodes: Mutex::new(InodeTable::new()),
            handles: Mutex::new(HashMap::new()),
            next_fh: AtomicU64::new(1),
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }

    fn attr(&self, ino: u64, info: FileInfo) -> fuser::FileAttr {
        let now = SystemTime::now();
        let (kind, perm, nlink, size) = match info.kind {
            EntryKind::Dir => (FileType::Directory, 0o755, 2, 0),
            EntryKind::File => (FileType::RegularFile, 0o444, 1, info.size),
        };
        fuser::FileAttr {
            ino,
            size,
            blocks: size.div_ceil(512),
            atime: now,
            mtime: now,
            ctime: now,
            crtime: now,
            kind,
            perm,
            nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: 4096,
            flags: 0,
        }
    }
}

impl fuser::Filesystem for ZxdbFuse {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        let (path, ino) = {
            let mut inodes = self.inodes.lock();
            let Some(parent_path) = inodes.path_of(parent) else {
                reply.error(libc::ENOENT);
                return;
            };
            let path = child_path(parent_path, name);
            let ino = inodes.ino_for(&path);
            (path, ino)
        };
        let info = self.fs.getattr(&path);
        reply.entry(&TTL, &self.attr(ino, info), 0);
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let path = match self.inodes.lock().path_of(ino) {
            Some(path) => path.to_string(),
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };
        let info = self.fs.getattr(&path);
        reply.attr(&TTL, &self.attr(ino, info));
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let (path, parent_ino) = {
            let inodes = self.inodes.lock();
            let Some(path) = inodes.path_of(ino).map(str::to_string) else {
                reply.error(libc::ENOENT);
                return;
            };
            let parent_ino = zxdbfs_core::paths::dirname(&path)
                .and_then(|parent| inodes.by_path.get(parent).copied())
                .unwrap_or(ino);
            (path, parent_ino)
        };

        let children: Vec<DirEntry> = self.fs.readdir(&path);
        debug!(%path, entries = children.len(), "readdir");

        let mut entries: Vec<(u64, FileType, String)> = Vec::with_capacity(children.len() + 2);
        entries.push((ino, FileType::Directory, ".".to_string()));
        entries.push((parent_ino, FileType::Directory, "..".to_string()));
        {
            let mut inodes = self.inodes.lock();
            for child in children {
                let child_ino = inodes.ino_for(&child_path(&path, &child.name));
                let kind = match child.kind {
                    EntryKind::Dir => FileType::Directory,
                    EntryKind::File => FileType::RegularFile,
                };
                entries.push((child_ino, kind, child.name));
            }
        }

        for (i, (entry_ino, kind, name)) in entries.into_iter().enumerate().skip(offset as usize) {
            // add returns true when the reply buffer is full
            if reply.add(entry_ino, (i + 1) as i64, kind, &name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let write_flags = libc::O_WRONLY | libc::O_RDWR | libc::O_APPEND | libc::O_TRUNC;
        if flags & write_flags != 0 {
            reply.error(libc::EROFS);
            return;
        }
        let path = match self.inodes.lock().path_of(ino) {
            Some(path) => path.to_string(),
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };
        match self.fs.open_file(&path) {
            Ok(body) => {
                let fh = self.next_fh.fetch_add(1, Ordering::Relaxed);
                debug!(%path, fh, size = body.len(), "opened");
                self.handles.lock().insert(fh, body);
                reply.opened(fh, 0);
            }
            Err(err) => {
                warn!(%path, %err, "open failed");
                reply.error(errno_for(&err));
            }
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let handles = self.handles.lock();
        match handles.get(&fh) {
            Some(buf) => reply.data(read_window(buf, offset, size)),
            None => reply.error(libc::EBADF),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        match self.handles.lock().remove(&fh) {
            Some(_) => reply.ok(),
            None => reply.error(libc::EBADF),
        }
    }
}
