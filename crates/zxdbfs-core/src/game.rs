//! Builds a full game directory from a ZXDB game detail response.
//!
//! Release files from every release are flattened into the game root
//! (name clashes are rare enough to ignore). POK cheat files from
//! `additionalDownloads` land in a `POKES/` subdirectory and screenshots
//! from `screens` in `SCRSHOT/`; either subdirectory is omitted when it
//! would be empty. A game with neither is just a flat directory of
//! release files.

use serde_json::Value;
use tracing::debug;
use zxdbfs_types::VfsNode;

use crate::error::{Result, ZxdbError};
use crate::fetch::{Fetcher, UrlCache};
use crate::paths;

/// `additionalDownloads` format string marking a POK cheat file.
pub const POKES_FORMAT: &str = "Pokes (POK)";

fn file_node(game_root: &str, subdir: Option<&str>, archive_path: &str, size: u64) -> Option<VfsNode> {
    let filename = paths::basename(archive_path)?;
    let fs_path = match subdir {
        Some(sub) => format!("{game_root}/{sub}/{filename}"),
        None => format!("{game_root}/{filename}"),
    };
    Some(VfsNode::file(
        fs_path,
        paths::fixup_wos_path(archive_path),
        size,
    ))
}

/// Build the game directory rooted at `path` from the parsed detail
/// response `doc`. `releases` must be present; the optional sections are
/// treated as empty when absent.
pub fn build_game(path: &str, doc: &Value) -> Result<VfsNode> {
    let source = doc
        .get("_source")
        .ok_or_else(|| ZxdbError::schema("_source", "game"))?;
    let releases = source
        .get("releases")
        .and_then(Value::as_array)
        .ok_or_else(|| ZxdbError::schema("releases", "game"))?;

    let mut children = Vec::new();
    for release in releases {
        let files = release
            .get("files")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for file in files {
            let Some(archive_path) = file.get("path").and_then(Value::as_str) else {
                continue;
            };
            let size = file.get("size").and_then(Value::as_u64).unwrap_or(0);
            if let Some(node) = file_node(path, None, archive_path, size) {
                children.push(node);
            }
        }
    }

    let pokes: Vec<VfsNode> = source
        .get("additionalDownloads")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter(|d| d.get("format").and_then(Value::as_str) == Some(POKES_FORMAT))
        .filter_map(|d| {
            let archive_path = d.get("path").and_then(Value::as_str)?;
            let size = d.get("size").and_then(Value::as_u64).unwrap_or(0);
            file_node(path, Some("POKES"), archive_path, size)
        })
        .collect();
    if !pokes.is_empty() {
        children.push(VfsNode::Dir {
            path: format!("{path}/POKES"),
            children: pokes,
        });
    }

    let screens: Vec<VfsNode> = source
        .get("screens")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|s| {
            let archive_url = s.get("url").and_then(Value::as_str)?;
            let size = s.get("size").and_then(Value::as_u64).unwrap_or(0);
            file_node(path, Some("SCRSHOT"), archive_url, size)
        })
        .collect();
    if !screens.is_empty() {
        children.push(VfsNode::Dir {
            path: format!("{path}/SCRSHOT"),
            children: screens,
        });
    }

    Ok(VfsNode::Dir {
        path: path.to_string(),
        children,
    })
}

/// Fetch a game's detail record and build its directory tree.
///
/// `fs_path` may point anywhere inside the game subtree; the returned
/// tree is always rooted at the game root derived from it. For `file://`
/// hosts the API URL cannot be synthesized, so `url_path` supplies the
/// document location instead.
pub fn fetch_game(
    fetcher: &Fetcher,
    urlcache: &UrlCache,
    fs_path: &str,
    host: &str,
    url_path: Option<&str>,
) -> Result<VfsNode> {
    let tid = paths::title_and_id(fs_path)?;
    let url = match url_path {
        Some(p) => p.to_string(),
        None => paths::game_url_path(&tid.id),
    };
    debug!(game_root = %tid.root, %url, "fetching game detail");
    let doc = fetcher.fetch_json(urlcache, host, &url)?;
    build_game(&tid.root, &doc)
}
