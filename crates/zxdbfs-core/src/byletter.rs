//! Builds a letter-index directory from a by-letter API response.
//!
//! Each hit becomes a [`VfsNode::DirStub`] named `<title>_<id>`, with `/`
//! and `:` in the title rewritten to `_` so the name is a legal path
//! component. The stub is expanded into the real game tree on first use.

use serde_json::Value;
use tracing::{debug, warn};
use zxdbfs_types::VfsNode;

use crate::error::{Result, ZxdbError};

/// Rewrite characters that would break a path component.
pub fn sanitize_entry_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == ':' { '_' } else { c })
        .collect()
}

/// Build the directory for `path` (e.g. `/by-letter/X`) from the parsed
/// by-letter response `doc`.
pub fn build_by_letter(path: &str, doc: &Value) -> Result<VfsNode> {
    let hits = doc
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| ZxdbError::schema("hits.hits", "by-letter"))?;

    let mut children = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(source) = hit.get("_source") else {
            debug!("by-letter hit without _source, skipping");
            continue;
        };
        let (Some(title), Some(id)) = (
            source.get("title").and_then(Value::as_str),
            hit.get("_id").and_then(Value::as_str),
        ) else {
            warn!("by-letter hit missing title or _id, skipping");
            continue;
        };
        let name = sanitize_entry_name(&format!("{title}_{id}"));
        children.push(VfsNode::stub(format!("{path}/{name}")));
    }

    Ok(VfsNode::Dir {
        path: path.to_string(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FsCache;
    use serde_json::json;

    fn by_letter_doc(entries: &[(&str, &str)]) -> Value {
        let hits: Vec<Value> = entries
            .iter()
            .map(|(id, title)| {
                json!({
                    "_id": id,
                    "_source": { "title": title, "contentType": "SOFTWARE" }
                })
            })
            .collect();
        json!({ "hits": { "total": { "value": hits.len() }, "hits": hits } })
    }

    #[test]
    fn builds_stub_dirs_from_hits() {
        let doc = by_letter_doc(&[("0005795", "Xevious"), ("0003972", "Quazatron")]);
        let dir = build_by_letter("/by-letter/X", &doc).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.path(), "/by-letter/X");
        assert_eq!(dir.child_count(), 2);
        assert_eq!(dir.children()[0].path(), "/by-letter/X/Xevious_0005795");
        assert!(dir.children()[0].is_stub());
        assert_eq!(dir.children()[1].path(), "/by-letter/X/Quazatron_0003972");
    }

    #[test]
    fn sanitizes_slashes_and_colons_in_titles() {
        // only '/' and ':' are rewritten; spaces and everything else survive
        let doc = by_letter_doc(&[("0001234", "Ace: The/Sequel")]);
        let dir = build_by_letter("/by-letter/A", &doc).unwrap();
        assert_eq!(
            dir.children()[0].path(),
            "/by-letter/A/Ace_ The_Sequel_0001234"
        );
        assert_eq!(sanitize_entry_name("R-Type"), "R-Type");
    }

    #[test]
    fn skips_hits_missing_source_or_title() {
        let doc = json!({
            "hits": { "hits": [
                { "_id": "0000001" },
                { "_id": "0000002", "_source": {} },
                { "_id": "0000003", "_source": { "title": "Good" } }
            ]}
        });
        let dir = build_by_letter("/by-letter/G", &doc).unwrap();
        assert_eq!(dir.child_count(), 1);
        assert_eq!(dir.children()[0].path(), "/by-letter/G/Good_0000003");
    }

    #[test]
    fn missing_hits_is_a_schema_error() {
        let err = build_by_letter("/by-letter/X", &json!({ "took": 3 })).unwrap_err();
        assert!(matches!(err, ZxdbError::Schema { field: "hits.hits", .. }));
    }

    #[test]
    fn full_index_registers_one_key_per_stub() {
        let entries: Vec<(String, String)> = (0..115)
            .map(|i| (format!("{:07}", i + 1), format!("Game{i}")))
            .collect();
        let borrowed: Vec<(&str, &str)> = entries
            .iter()
            .map(|(id, t)| (id.as_str(), t.as_str()))
            .collect();
        let doc = by_letter_doc(&borrowed);
        let dir = build_by_letter("/by-letter/G", &doc).unwrap();
        assert_eq!(dir.child_count(), 115);

        let cache = FsCache::new();
        cache.add_all("/by-letter/G", dir);
        // 115 stubs plus the index directory itself
        assert_eq!(cache.len(), 116);
    }
}
