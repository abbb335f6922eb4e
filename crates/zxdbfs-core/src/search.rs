//! Builds a search-result directory from a ZXDB search response.
//!
//! The API already ranks hits by relevance; this layer applies two local
//! filters on top. A hit is dropped when its `_score` is at or below the
//! caller's floor, and when a term is supplied it must appear
//! case-insensitively in either the title or one of the publisher names.
//! Survivors become [`VfsNode::DirStub`] children named `<title>_<id>`.

use serde_json::Value;
use tracing::{debug, trace};
use zxdbfs_types::VfsNode;

use crate::error::{Result, ZxdbError};
use crate::fetch::{Fetcher, UrlCache};
use crate::paths;

fn matches_term(source: &Value, title: &str, term: &str) -> bool {
    let needle = term.to_lowercase();
    if title.to_lowercase().contains(&needle) {
        return true;
    }
    source
        .get("publishers")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|p| p.get("name").and_then(Value::as_str))
        .any(|name| name.to_lowercase().contains(&needle))
}

/// Build the result directory for `path` from the parsed search
/// response `doc`, keeping hits scoring strictly above `minscore` that
/// match `term` (when given).
pub fn build_search(
    path: &str,
    doc: &Value,
    minscore: f64,
    term: Option<&str>,
) -> Result<VfsNode> {
    let hits = doc
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| ZxdbError::schema("hits.hits", "search"))?;

    let mut children = Vec::new();
    for hit in hits {
        let Some(source) = hit.get("_source") else {
            return Err(ZxdbError::schema("_source", "search"));
        };
        let (Some(title), Some(id)) = (
            source.get("title").and_then(Value::as_str),
            hit.get("_id").and_then(Value::as_str),
        ) else {
            debug!("search hit missing title or _id, skipping");
            continue;
        };

        if let Some(score) = hit.get("_score").and_then(Value::as_f64) {
            if score <= minscore {
                trace!(title, score, minscore, "rejected on score");
                continue;
            }
        }
        if let Some(term) = term {
            if !matches_term(source, title, term) {
                trace!(title, term, "rejected on term");
                continue;
            }
        }

        children.push(VfsNode::stub(format!("{path}/{title}_{id}")));
    }

    Ok(VfsNode::Dir {
        path: path.to_string(),
        children,
    })
}

/// Fetch search results for a `/search/<term>` path and build the
/// result directory. For `file://` hosts the query URL cannot be
/// synthesized, so `url_path` supplies the document location instead.
pub fn fetch_search(
    fetcher: &Fetcher,
    urlcache: &UrlCache,
    fs_path: &str,
    host: &str,
    url_path: Option<&str>,
) -> Result<VfsNode> {
    let (term, _rest) = paths::search_term(fs_path)?;
    let url = match url_path {
        Some(p) => p.to_string(),
        None => paths::search_url_path(&term),
    };
    debug!(%term, %url, "fetching search results");
    let doc = fetcher.fetch_json(urlcache, host, &url)?;
    build_search(fs_path, &doc, 0.0, Some(&term))
}
