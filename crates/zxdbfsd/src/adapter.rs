//! Path-based filesystem operations over the core caches.
//!
//! This layer answers the three questions FUSE actually asks, in terms of
//! plain string paths: what is this (`getattr`), what is in it (`readdir`),
//! and give me its bytes (`open_file`). Directory listings degrade to empty
//! and attribute lookups degrade to a plain directory when the backing
//! fetch fails, so a flaky network shows up as an empty folder rather than
//! an I/O error storm. Opening a file is the one place failures are real
//! and surfaced.

use std::sync::Arc;

use tracing::{debug, info, warn};
use zxdbfs_core::paths::{self, CacheOp, PathClass, StatusKind};
use zxdbfs_core::{byletter, game, search};
use zxdbfs_core::{Fetcher, FsCache, Result, Unstubber, UrlCache, ZxdbError};
use zxdbfs_types::VfsNode;

use crate::options::Options;
use crate::status::StatusSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

/// What `getattr` needs to know about a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub kind: EntryKind,
    pub size: u64,
}

impl FileInfo {
    pub const DIR: FileInfo = FileInfo {
        kind: EntryKind::Dir,
        size: 0,
    };

    fn file(size: u64) -> FileInfo {
        FileInfo {
            kind: EntryKind::File,
            size,
        }
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

impl DirEntry {
    fn dir(name: impl Into<String>) -> DirEntry {
        DirEntry {
            name: name.into(),
            kind: EntryKind::Dir,
            size: 0,
        }
    }

    fn file(name: impl Into<String>, size: u64) -> DirEntry {
        DirEntry {
            name: name.into(),
            kind: EntryKind::File,
            size,
        }
    }
}

pub struct ZxdbFs {
    opts: Options,
    fscache: Arc<FsCache>,
    urlcache: Arc<UrlCache>,
    fetcher: Arc<Fetcher>,
    unstubber: Unstubber,
    status: Box<dyn StatusSource>,
}

impl ZxdbFs {
    pub fn new(opts: Options, status: Box<dyn StatusSource>) -> Self {
        let fscache = Arc::new(FsCache::new());
        let urlcache = Arc::new(UrlCache::new());
        let fetcher = Arc::new(Fetcher::new(&opts.useragent));
        let unstubber = Unstubber::new(
            fscache.clone(),
            urlcache.clone(),
            fetcher.clone(),
            opts.zxdb_root_url.clone(),
        );
        Self {
            opts,
            fscache,
            urlcache,
            fetcher,
            unstubber,
            status,
        }
    }

    fn node_info(node: &VfsNode) -> FileInfo {
        match node {
            VfsNode::File { size, .. } => FileInfo::file(*size),
            _ => FileInfo::DIR,
        }
    }

    /// Resolve attributes for a path, triggering builder chains for game
    /// and search paths that are not cached yet.
    pub fn getattr(&self, path: &str) -> FileInfo {
        match paths::classify(path) {
            PathClass::Root
            | PathClass::ByLetterRoot
            | PathClass::SearchRoot
            | PathClass::StatusDir
            | PathClass::ByLetterIndex(_) => FileInfo::DIR,
            PathClass::CacheControl(op) => {
                self.run_cache_op(op);
                FileInfo::DIR
            }
            PathClass::StatusFile(kind) => {
                let size = self
                    .status
                    .blob(kind)
                    .map(|b| b.len() as u64)
                    .unwrap_or(0);
                FileInfo::file(size)
            }
            PathClass::GameSubtree(_) => self.game_attr(path),
            PathClass::SearchTerm(term) => self.search_attr(path, &term, ""),
            PathClass::SearchSubtree { term, rest } => self.search_attr(path, &term, &rest),
            PathClass::Unknown => FileInfo::DIR,
        }
    }

    /// `stat`-ing the cache-control paths is how flushes are triggered:
    /// `ls /mnt/cache/fscache/flush` is the whole management interface.
    fn run_cache_op(&self, op: CacheOp) {
        match op {
            CacheOp::FsCacheDump => {
                let dump = self.fscache.dump_json();
                info!(entries = self.fscache.len(), "fscache dump requested");
                debug!(%dump, "fscache contents");
            }
            CacheOp::FsCacheFlush => {
                info!(entries = self.fscache.len(), "flushing fscache");
                self.fscache.flush();
            }
            CacheOp::UrlCacheFlush => {
                info!(entries = self.urlcache.len(), "flushing urlcache");
                self.urlcache.flush();
            }
            CacheOp::Other => {}
        }
    }

    fn game_attr(&self, path: &str) -> FileInfo {
        if let Some(node) = self.fscache.get(path) {
            return Self::node_info(&node);
        }
        match game::fetch_game(
            &self.fetcher,
            &self.urlcache,
            path,
            &self.opts.zxdb_root_url,
            None,
        ) {
            Ok(tree) => {
                let root = tree.path().to_string();
                self.fscache.add_all(&root, tree);
                match self.fscache.get(path) {
                    Some(node) => Self::node_info(&node),
                    None => FileInfo::DIR,
                }
            }
            Err(err) => {
                warn!(path, %err, "failed to load game data");
                FileInfo::DIR
            }
        }
    }

    fn search_attr(&self, path: &str, term: &str, rest: &str) -> FileInfo {
        if let Some(node) = self.fscache.get(path) {
            return Self::node_info(&node);
        }
        let search_key = format!("/search/{term}");
        if self.fscache.get(&search_key).is_none() {
            match search::fetch_search(
                &self.fetcher,
                &self.urlcache,
                &search_key,
                &self.opts.zxdb_root_url,
                None,
            ) {
                Ok(results) => {
                    info!(term, results = results.child_count(), "search complete");
                    self.fscache.add_all(&search_key, results);
                    self.register_search_term(&search_key);
                }
                Err(err) => {
                    warn!(term, %err, "search failed");
                    return FileInfo::DIR;
                }
            }
        }
        if rest.is_empty() {
            match self.fscache.get(path) {
                Some(node) => Self::node_info(&node),
                None => FileInfo::DIR,
            }
        } else {
            self.game_attr(path)
        }
    }

    /// Record a completed search under `/search` so the root listing
    /// shows every term queried this session.
    fn register_search_term(&self, search_key: &str) {
        let mut root = self
            .fscache
            .get("/search")
            .unwrap_or_else(|| VfsNode::Dir {
                path: "/search".to_string(),
                children: vec![],
            });
        if root.children().iter().any(|c| c.path() == search_key) {
            return;
        }
        if let Err(err) = root.push(VfsNode::Dir {
            path: search_key.to_string(),
            children: vec![],
        }) {
            warn!(search_key, %err, "could not register search term");
            return;
        }
        self.fscache.add("/search", root);
    }

    /// List a directory. Magic directories are synthesized; everything
    /// else comes from the cache, expanding stubs on the way.
    pub fn readdir(&self, path: &str) -> Vec<DirEntry> {
        match paths::classify(path) {
            PathClass::Root => vec![
                DirEntry::dir("by-letter"),
                DirEntry::dir("search"),
                DirEntry::dir("status"),
            ],
            PathClass::ByLetterRoot => ('A'..='Z').map(|l| DirEntry::dir(l.to_string())).collect(),
            PathClass::StatusDir => {
                let size = |kind| {
                    self.status
                        .blob(kind)
                        .map(|b| b.len() as u64)
                        .unwrap_or(0)
                };
                vec![
                    DirEntry::file("binary", size(StatusKind::Binary)),
                    DirEntry::file("json", size(StatusKind::Json)),
                ]
            }
            PathClass::SearchRoot => self.cached_children("/search"),
            PathClass::ByLetterIndex(letter) => self.by_letter_children(letter),
            PathClass::GameSubtree(_)
            | PathClass::SearchTerm(_)
            | PathClass::SearchSubtree { .. } => self.cached_children(path),
            PathClass::CacheControl(_) | PathClass::StatusFile(_) | PathClass::Unknown => {
                Vec::new()
            }
        }
    }

    fn cached_children(&self, path: &str) -> Vec<DirEntry> {
        let node = match self.fscache.get(path) {
            Some(node) => node,
            None => {
                debug!(path, "listing for unpopulated path");
                return Vec::new();
            }
        };
        let node = if node.is_stub() {
            match self.unstubber.ensure(path) {
                Ok(node) => node,
                Err(err) => {
                    warn!(path, %err, "could not expand directory");
                    return Vec::new();
                }
            }
        } else {
            node
        };
        node.children()
            .iter()
            .filter_map(|child| {
                let name = paths::basename(child.path())?;
                Some(match child {
                    VfsNode::File { size, .. } => DirEntry::file(name, *size),
                    _ => DirEntry::dir(name),
                })
            })
            .collect()
    }

    fn by_letter_children(&self, letter: char) -> Vec<DirEntry> {
        let key = format!("/by-letter/{letter}");
        if self.fscache.get(&key).is_none() {
            if !self.preload_by_letter(letter) {
                if let Err(err) = self.fetch_by_letter(letter) {
                    warn!(%letter, %err, "by-letter index unavailable");
                    return Vec::new();
                }
            }
        }
        self.cached_children(&key)
    }

    fn by_letter_file(&self, letter: char) -> std::path::PathBuf {
        self.opts
            .cache_root_dir
            .join(format!("by-letter-{letter}.json"))
    }

    /// Try to seed the index from a previous session's writeback.
    fn preload_by_letter(&self, letter: char) -> bool {
        let file = self.by_letter_file(letter);
        let raw = match std::fs::read(&file) {
            Ok(raw) => raw,
            Err(_) => return false,
        };
        let doc: serde_json::Value = match serde_json::from_slice(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(file = %file.display(), %err, "discarding corrupt by-letter writeback");
                return false;
            }
        };
        let key = format!("/by-letter/{letter}");
        match byletter::build_by_letter(&key, &doc) {
            Ok(dir) => {
                info!(%letter, entries = dir.child_count(), "preloaded by-letter index");
                self.fscache.add_all(&key, dir);
                true
            }
            Err(err) => {
                warn!(file = %file.display(), %err, "by-letter writeback unusable");
                false
            }
        }
    }

    fn fetch_by_letter(&self, letter: char) -> Result<()> {
        let key = format!("/by-letter/{letter}");
        let url = paths::by_letter_url_path(letter);
        let doc = self
            .fetcher
            .fetch_json(&self.urlcache, &self.opts.zxdb_root_url, &url)?;

        // persist for the next mount; failure here only costs a refetch
        let file = self.by_letter_file(letter);
        match serde_json::to_string_pretty(doc.as_ref()) {
            Ok(text) => {
                if let Err(err) = std::fs::write(&file, text) {
                    warn!(file = %file.display(), %err, "by-letter writeback failed");
                } else {
                    debug!(file = %file.display(), "by-letter writeback complete");
                }
            }
            Err(err) => warn!(%letter, %err, "could not serialize by-letter response"),
        }

        let dir = byletter::build_by_letter(&key, &doc)?;
        info!(%letter, entries = dir.child_count(), "fetched by-letter index");
        self.fscache.add_all(&key, dir);
        Ok(())
    }

    /// Fetch the full content of a file. Status files come from their
    /// local snapshots, everything else from its download host.
    pub fn open_file(&self, path: &str) -> Result<Vec<u8>> {
        if let PathClass::StatusFile(kind) = paths::classify(path) {
            return Ok(self.status.blob(kind)?);
        }

        let node = self
            .fscache
            .get(path)
            .ok_or_else(|| ZxdbError::not_found(path))?;
        let url = match &node {
            VfsNode::File { url, .. } => url.clone(),
            _ => return Err(ZxdbError::not_found(format!("{path} is not a file"))),
        };
        let host = paths::root_download_url(&url)
            .ok_or_else(|| ZxdbError::not_found(format!("no download host serves {url}")))?;

        info!(path, host, url, "downloading file");
        let body = self.fetcher.fetch_bytes(host, &url)?;
        if node.size() != 0 && node.size() != body.len() as u64 {
            warn!(
                path,
                expected = node.size(),
                actual = body.len(),
                "download size differs from catalogue size"
            );
        }
        Ok(body)
    }

    #[cfg(test)]
    pub(crate) fn fscache(&self) -> &FsCache {
        &self.fscache
    }

    #[cfg(test)]
    pub(crate) fn urlcache(&self) -> &UrlCache {
        &self.urlcache
    }
}
