//! Path-keyed cache of materialized filesystem trees.
//!
//! Every node of a registered tree is reachable in one lookup: [`FsCache::add_all`]
//! walks the tree and inserts a copy of each descendant under its own path, so
//! `getattr("/by-letter/X/Xevious_0005795/POKES/x.pok")` never has to descend
//! from the root. The price is duplication, which stays cheap because trees
//! are shallow and nodes are small.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;
use zxdbfs_types::VfsNode;

/// Shared, lock-protected path-to-node map.
#[derive(Debug, Default)]
pub struct FsCache {
    inner: RwLock<BTreeMap<String, VfsNode>>,
}

impl FsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Look up the node registered at `path`. Returns a copy so the lock
    /// is never held across caller work.
    pub fn get(&self, path: &str) -> Option<VfsNode> {
        self.inner.read().get(path).cloned()
    }

    /// Register a single node at `path`, replacing any previous entry.
    /// Children of a directory node are *not* registered; use
    /// [`FsCache::add_all`] for that.
    pub fn add(&self, path: &str, node: VfsNode) {
        trace!(path, "fscache add");
        self.inner.write().insert(path.to_string(), node);
    }

    /// Register `node` at `path` and every descendant under its own path.
    pub fn add_all(&self, path: &str, node: VfsNode) {
        let mut map = self.inner.write();
        register_tree(&mut map, path, node);
    }

    /// Atomically drop the entry at `path` and register `node` (plus all
    /// of its descendants) in its place. Readers never observe the gap.
    pub fn replace_all(&self, path: &str, node: VfsNode) {
        let mut map = self.inner.write();
        map.remove(path);
        register_tree(&mut map, path, node);
    }

    /// Remove a single entry. Returns false when nothing was registered
    /// at `path`. Descendant entries are left alone.
    pub fn delete(&self, path: &str) -> bool {
        self.inner.write().remove(path).is_some()
    }

    /// Drop every entry.
    pub fn flush(&self) {
        let mut map = self.inner.write();
        trace!(entries = map.len(), "fscache flush");
        map.clear();
    }

    /// Snapshot the whole cache as a JSON object keyed by path, for the
    /// `/cache/fscache` diagnostic dump.
    pub fn dump_json(&self) -> Value {
        let map = self.inner.read();
        let mut out = serde_json::Map::with_capacity(map.len());
        for (path, node) in map.iter() {
            match serde_json::to_value(node) {
                Ok(v) => {
                    out.insert(path.clone(), v);
                }
                Err(err) => {
                    tracing::warn!(path, %err, "failed to serialize cache entry");
                }
            }
        }
        Value::Object(out)
    }
}

fn register_tree(map: &mut BTreeMap<String, VfsNode>, path: &str, node: VfsNode) {
    for child in node.children() {
        register_tree(map, child.path(), child.clone());
    }
    trace!(path, "fscache add (tree)");
    map.insert(path.to_string(), node);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> VfsNode {
        VfsNode::Dir {
            path: "/by-letter/X/Xevious_0005795".to_string(),
            children: vec![
                VfsNode::file(
                    "/by-letter/X/Xevious_0005795/Xevious.tap.zip",
                    "/games/x/Xevious.tap.zip",
                    18492,
                ),
                VfsNode::Dir {
                    path: "/by-letter/X/Xevious_0005795/POKES".to_string(),
                    children: vec![VfsNode::file(
                        "/by-letter/X/Xevious_0005795/POKES/Xevious.pok",
                        "/pokes/x/Xevious.pok",
                        120,
                    )],
                },
            ],
        }
    }

    #[test]
    fn add_registers_only_the_root() {
        let cache = FsCache::new();
        cache.add("/by-letter/X/Xevious_0005795", sample_tree());
        assert_eq!(cache.len(), 1);
        assert!(cache.get("/by-letter/X/Xevious_0005795/POKES").is_none());
    }

    #[test]
    fn add_all_registers_every_descendant() {
        let cache = FsCache::new();
        cache.add_all("/by-letter/X/Xevious_0005795", sample_tree());
        assert_eq!(cache.len(), 4);

        let pokes = cache.get("/by-letter/X/Xevious_0005795/POKES").unwrap();
        assert!(pokes.is_dir());
        assert_eq!(pokes.child_count(), 1);

        let pok = cache
            .get("/by-letter/X/Xevious_0005795/POKES/Xevious.pok")
            .unwrap();
        assert_eq!(pok.size(), 120);
    }

    #[test]
    fn get_returns_a_copy() {
        let cache = FsCache::new();
        cache.add_all("/by-letter/X/Xevious_0005795", sample_tree());
        let a = cache.get("/by-letter/X/Xevious_0005795").unwrap();
        let b = cache.get("/by-letter/X/Xevious_0005795").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn replace_all_swaps_a_stub_for_a_tree() {
        let cache = FsCache::new();
        cache.add(
            "/by-letter/X/Xevious_0005795",
            VfsNode::stub("/by-letter/X/Xevious_0005795"),
        );
        cache.replace_all("/by-letter/X/Xevious_0005795", sample_tree());
        let node = cache.get("/by-letter/X/Xevious_0005795").unwrap();
        assert!(node.is_dir());
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn delete_and_flush() {
        let cache = FsCache::new();
        cache.add_all("/by-letter/X/Xevious_0005795", sample_tree());
        assert!(cache.delete("/by-letter/X/Xevious_0005795/POKES"));
        assert!(!cache.delete("/by-letter/X/Xevious_0005795/POKES"));
        cache.flush();
        assert!(cache.is_empty());
    }

    #[test]
    fn dump_is_keyed_by_path() {
        let cache = FsCache::new();
        cache.add_all("/by-letter/X/Xevious_0005795", sample_tree());
        let dump = cache.dump_json();
        let obj = dump.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(
            obj["/by-letter/X/Xevious_0005795"]["type"],
            Value::from("dir")
        );
    }
}
