//! Memoized retrieval of JSON documents and raw file bodies.
//!
//! Hosts come in two flavours: `file://<dir>` roots, which read straight
//! from the local filesystem (and are what the tests use), and everything
//! else, which goes over HTTP through a single shared [`ureq::Agent`].
//! JSON responses are memoized in the [`UrlCache`] keyed by the full
//! `host + path` string, so repeated directory walks never re-hit the API.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Result, ZxdbError};

/// Per-request timeout, covering connect through body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml,application/json,application/zip;q=0.9,image/webp,*/*;q=0.8";

/// Memo table of parsed JSON responses, keyed by full URL. Entries are
/// shared handles, so a hit costs one refcount bump.
#[derive(Debug, Default)]
pub struct UrlCache {
    inner: Mutex<HashMap<String, Arc<Value>>>,
}

impl UrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn get(&self, url: &str) -> Option<Arc<Value>> {
        self.inner.lock().get(url).cloned()
    }

    pub fn put(&self, url: &str, doc: Arc<Value>) {
        self.inner.lock().insert(url.to_string(), doc);
    }

    pub fn flush(&self) {
        let mut map = self.inner.lock();
        trace!(entries = map.len(), "urlcache flush");
        map.clear();
    }
}

/// HTTP/file retrieval front end.
pub struct Fetcher {
    agent: ureq::Agent,
}

impl Fetcher {
    pub fn new(user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }

    /// Fetch `host + path` and parse the body as JSON, consulting and
    /// populating `cache`.
    pub fn fetch_json(&self, cache: &UrlCache, host: &str, path: &str) -> Result<Arc<Value>> {
        let url = format!("{host}{path}");
        if let Some(hit) = cache.get(&url) {
            trace!(%url, "urlcache hit");
            return Ok(hit);
        }
        debug!(%url, "urlcache miss, fetching");
        let body = self.fetch_bytes(host, path)?;
        let doc: Value = serde_json::from_slice(&body)
            .map_err(|source| ZxdbError::JsonParse { url: url.clone(), source })?;
        let doc = Arc::new(doc);
        cache.put(&url, doc.clone());
        Ok(doc)
    }

    /// Fetch `host + path` as raw bytes, never cached. Used for the actual
    /// game files, which are too large to keep around.
    pub fn fetch_bytes(&self, host: &str, path: &str) -> Result<Vec<u8>> {
        if let Some(root) = host.strip_prefix("file://") {
            let local = format!("{root}{path}");
            trace!(%local, "reading local file");
            return Ok(std::fs::read(&local)?);
        }

        let url = format!("{host}{path}");
        let response = self
            .agent
            .get(&url)
            .set("Accept", ACCEPT_HEADER)
            .set("Accept-Charset", "utf-8")
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => ZxdbError::Http {
                    status,
                    url: url.clone(),
                },
                ureq::Error::Transport(t) => ZxdbError::Transport(t.to_string()),
            })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|err| ZxdbError::Transport(err.to_string()))?;
        Ok(body)
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_host(dir: &tempfile::TempDir) -> String {
        format!("file://{}", dir.path().display())
    }

    #[test]
    fn file_host_reads_local_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("game.json")).unwrap();
        f.write_all(br#"{"_id": "0005795"}"#).unwrap();

        let fetcher = Fetcher::new("zxdbfs-test");
        let cache = UrlCache::new();
        let doc = fetcher
            .fetch_json(&cache, &file_host(&dir), "/game.json")
            .unwrap();
        assert_eq!(doc["_id"], "0005795");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn second_fetch_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, br#"{"n": 1}"#).unwrap();

        let fetcher = Fetcher::new("zxdbfs-test");
        let cache = UrlCache::new();
        let first = fetcher
            .fetch_json(&cache, &file_host(&dir), "/game.json")
            .unwrap();

        // change the on-disk content: a cache hit must not see it
        std::fs::write(&path, br#"{"n": 2}"#).unwrap();
        let second = fetcher
            .fetch_json(&cache, &file_host(&dir), "/game.json")
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second["n"], 1);

        cache.flush();
        let third = fetcher
            .fetch_json(&cache, &file_host(&dir), "/game.json")
            .unwrap();
        assert_eq!(third["n"], 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new("zxdbfs-test");
        let cache = UrlCache::new();
        let err = fetcher
            .fetch_json(&cache, &file_host(&dir), "/doesnotexist.json")
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(cache.is_empty());
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), b"not json at all").unwrap();
        let fetcher = Fetcher::new("zxdbfs-test");
        let cache = UrlCache::new();
        let err = fetcher
            .fetch_json(&cache, &file_host(&dir), "/bad.json")
            .unwrap_err();
        assert!(matches!(err, ZxdbError::JsonParse { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn fetch_bytes_returns_raw_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0u8, 1, 2, 3]).unwrap();
        let fetcher = Fetcher::new("zxdbfs-test");
        let body = fetcher.fetch_bytes(&file_host(&dir), "/blob.bin").unwrap();
        assert_eq!(body, vec![0, 1, 2, 3]);
    }
}
