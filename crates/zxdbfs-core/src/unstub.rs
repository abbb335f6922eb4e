//! Expansion of directory stubs into full game trees.
//!
//! Index and search listings are cheap: each entry is a [`VfsNode::DirStub`]
//! holding nothing but its path. The first time a stub is actually entered,
//! the [`Unstubber`] fetches the game's detail record, builds the real tree
//! and swaps it into the cache in one atomic step. A stub is expanded at
//! most once; concurrent callers for the same path serialize on a gate and
//! the loser finds the work already done. On failure the stub stays in
//! place, so a later attempt can retry.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use zxdbfs_types::VfsNode;

use crate::cache::FsCache;
use crate::error::{Result, ZxdbError};
use crate::fetch::{Fetcher, UrlCache};
use crate::game;

pub struct Unstubber {
    fscache: Arc<FsCache>,
    urlcache: Arc<UrlCache>,
    fetcher: Arc<Fetcher>,
    host: String,
    // serializes expansions so a stub is fetched at most once
    gate: Mutex<()>,
}

impl Unstubber {
    pub fn new(
        fscache: Arc<FsCache>,
        urlcache: Arc<UrlCache>,
        fetcher: Arc<Fetcher>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            fscache,
            urlcache,
            fetcher,
            host: host.into(),
            gate: Mutex::new(()),
        }
    }

    /// Make sure the cache entry at `path` is a populated node, expanding
    /// it if it is still a stub. Non-stub entries pass through untouched;
    /// an unregistered path is an error.
    pub fn ensure(&self, path: &str) -> Result<VfsNode> {
        self.ensure_at(path, None)
    }

    /// As [`Unstubber::ensure`], with an explicit URL path for `file://`
    /// hosts where the API URL cannot be synthesized.
    pub fn ensure_at(&self, path: &str, url_path: Option<&str>) -> Result<VfsNode> {
        match self.fscache.get(path) {
            Some(node) if !node.is_stub() => return Ok(node),
            Some(_) => {}
            None => return Err(ZxdbError::unstub(path)),
        }

        let _expansion = self.gate.lock();

        // another caller may have expanded this path while we waited
        let node = self
            .fscache
            .get(path)
            .ok_or_else(|| ZxdbError::unstub(path))?;
        if !node.is_stub() {
            return Ok(node);
        }

        debug!(path, "expanding directory stub");
        let tree = game::fetch_game(&self.fetcher, &self.urlcache, path, &self.host, url_path)
            .map_err(|err| {
                warn!(path, %err, "stub expansion failed, leaving stub in place");
                err
            })?;

        let root = tree.path().to_string();
        self.fscache.replace_all(&root, tree);

        match self.fscache.get(path) {
            Some(node) if node.is_dir() => Ok(node),
            _ => Err(ZxdbError::unstub(path)),
        }
    }
}

impl std::fmt::Debug for Unstubber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unstubber")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
