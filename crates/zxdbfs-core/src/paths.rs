//! Virtual path grammar.
//!
//! Every kernel callback hands the daemon a plain string path; this module
//! decides what that path *means*. The grammar is small but has sharp
//! corners: game directories carry their ZXDB id as a `_NNNNNNN` suffix,
//! search paths smuggle the query term in the second segment, and a couple
//! of magic subtrees (`/status`, `/cache`) exist only as control surfaces.

use zxdbfs_types::GameId;

use crate::error::{Result, ZxdbError};

/// Mirror of the World of Spectrum archive used for `/games` and `/screens` files.
pub const WOS_MIRROR_URL: &str = "https://archive.org/download/World_of_Spectrum_June_2017_Mirror/World%20of%20Spectrum%20June%202017%20Mirror.zip/World%20of%20Spectrum%20June%202017%20Mirror/sinclair";

/// Download host for files served out of the ZXDB blob store.
pub const SPECTRUM_COMPUTING_URL: &str = "https://spectrumcomputing.co.uk";

/// What a virtual path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClass {
    /// The mount root.
    Root,
    /// One of the `/cache` control paths.
    CacheControl(CacheOp),
    /// The `/status` directory itself.
    StatusDir,
    /// One of the two magic status files.
    StatusFile(StatusKind),
    /// The `/by-letter` index root.
    ByLetterRoot,
    /// A single-letter index directory, e.g. `/by-letter/Q`.
    ByLetterIndex(char),
    /// Any path at or below a game root (`..._NNNNNNN`).
    GameSubtree(TitleAndId),
    /// The `/search` directory itself.
    SearchRoot,
    /// `/search/<term>` with nothing after the term.
    SearchTerm(String),
    /// `/search/<term>/...` where the trailing part is itself a game subtree.
    SearchSubtree { term: String, rest: String },
    /// Anything the grammar does not recognize.
    Unknown,
}

/// Cache-control targets under `/cache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    /// `/cache/fscache`: dump the filesystem cache as JSON.
    FsCacheDump,
    /// `/cache/fscache/flush`: empty the filesystem cache.
    FsCacheFlush,
    /// `/cache/urlcache/flush`: empty the URL cache.
    UrlCacheFlush,
    /// `/cache` or an unrecognized child of it.
    Other,
}

/// The two magic files under `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Json,
    Binary,
}

/// A game reference extracted from a virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleAndId {
    /// Title portion of the matched segment, underscore-sanitized form.
    pub title: String,
    /// Seven-digit ZXDB id.
    pub id: GameId,
    /// Path truncated at the end of the matched segment: the game's root
    /// directory, no trailing slash.
    pub root: String,
}

/// Classify a virtual path.
pub fn classify(path: &str) -> PathClass {
    match path {
        "/" => return PathClass::Root,
        "/cache/fscache" => return PathClass::CacheControl(CacheOp::FsCacheDump),
        "/cache/fscache/flush" => return PathClass::CacheControl(CacheOp::FsCacheFlush),
        "/cache/urlcache/flush" => return PathClass::CacheControl(CacheOp::UrlCacheFlush),
        "/status" => return PathClass::StatusDir,
        "/status/json" => return PathClass::StatusFile(StatusKind::Json),
        "/status/binary" => return PathClass::StatusFile(StatusKind::Binary),
        "/by-letter" => return PathClass::ByLetterRoot,
        "/search" => return PathClass::SearchRoot,
        _ => {}
    }
    if path == "/cache" || path.starts_with("/cache/") {
        return PathClass::CacheControl(CacheOp::Other);
    }
    if let Some(rest) = path.strip_prefix("/by-letter/") {
        let index = rest.trim_end_matches('/');
        if index.len() == 1 {
            if let Some(letter) = index.chars().next().filter(char::is_ascii_alphabetic) {
                return PathClass::ByLetterIndex(letter.to_ascii_uppercase());
            }
            return PathClass::Unknown;
        }
    }
    if path.starts_with("/search/") {
        if let Ok((term, rest)) = search_term(path) {
            if rest.is_empty() {
                return PathClass::SearchTerm(term);
            }
            return PathClass::SearchSubtree { term, rest };
        }
    }
    if let Ok(tid) = title_and_id(path) {
        return PathClass::GameSubtree(tid);
    }
    PathClass::Unknown
}

/// Extract the game title and id from a path.
///
/// Segments are scanned from the last towards the first. A segment matches
/// when it is at least seven bytes long and everything after its *last*
/// underscore is exactly seven decimal digits. The returned `root` is the
/// input truncated at the end of the matching segment.
pub fn title_and_id(path: &str) -> Result<TitleAndId> {
    let mut segments: Vec<(usize, usize)> = Vec::new();
    let mut start = 0usize;
    for (i, b) in path.bytes().enumerate() {
        if b == b'/' {
            if i > start {
                segments.push((start, i));
            }
            start = i + 1;
        }
    }
    if path.len() > start {
        segments.push((start, path.len()));
    }

    for &(s, e) in segments.iter().rev() {
        let segment = &path[s..e];
        if segment.len() < 7 {
            continue;
        }
        let Some(uscore) = segment.rfind('_') else {
            continue;
        };
        let tail = &segment[uscore + 1..];
        if tail.len() != 7 || !tail.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        return Ok(TitleAndId {
            title: segment[..uscore].to_string(),
            id: GameId::new(tail)?,
            root: path[..e].to_string(),
        });
    }

    Err(ZxdbError::path_parse(path))
}

/// Extract the search term (second segment) from a `/search/...` path.
///
/// Returns `(term, rest)` where `rest` is everything from the third
/// segment onwards including its leading slash, or empty when the path
/// stops at the term.
pub fn search_term(path: &str) -> Result<(String, String)> {
    if !path.starts_with("/search") {
        return Err(ZxdbError::path_parse(path));
    }
    let slashes: Vec<usize> = path
        .bytes()
        .enumerate()
        .filter_map(|(i, b)| (b == b'/').then_some(i))
        .collect();
    if slashes.len() < 2 {
        return Err(ZxdbError::path_parse(path));
    }
    let term_start = slashes[1] + 1;
    match slashes.get(2) {
        Some(&third) => Ok((
            path[term_start..third].to_string(),
            path[third..].to_string(),
        )),
        None => Ok((path[term_start..].to_string(), String::new())),
    }
}

/// Final path component. Trailing slash runs are ignored; `"/"` is its own
/// basename and an empty input has none.
pub fn basename(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Some("/");
    }
    match trimmed.rfind('/') {
        Some(i) => Some(&trimmed[i + 1..]),
        None => Some(trimmed),
    }
}

/// Parent path. Interior slash runs are preserved verbatim; the run in
/// front of the final component is dropped entirely. A bare name has
/// parent `"."` and anything directly under the root has parent `"/"`.
pub fn dirname(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Some("/");
    }
    match trimmed.rfind('/') {
        None => Some("."),
        Some(mut i) => {
            while i > 0 && trimmed.as_bytes()[i - 1] == b'/' {
                i -= 1;
            }
            if i == 0 { Some("/") } else { Some(&trimmed[..i]) }
        }
    }
}

/// Strip the legacy World of Spectrum `/pub/sinclair` prefix from an
/// archive path. Paths without the prefix pass through unchanged.
pub fn fixup_wos_path(path: &str) -> &str {
    path.strip_prefix("/pub/sinclair").unwrap_or(path)
}

/// Pick the download host for an archive-relative file URL, or `None`
/// when no host is known to serve it.
pub fn root_download_url(url: &str) -> Option<&'static str> {
    if url.starts_with("/zxdb/sinclair") {
        Some(SPECTRUM_COMPUTING_URL)
    } else if url.starts_with("/games") || url.starts_with("/screens") {
        Some(WOS_MIRROR_URL)
    } else {
        None
    }
}

/// API URL path for a single game's compact detail record.
pub fn game_url_path(id: &GameId) -> String {
    format!("/games/{id}?mode=compact")
}

/// API URL path for the tiny-mode listing of every title under a letter.
pub fn by_letter_url_path(letter: char) -> String {
    format!("/games/byletter/{letter}?contenttype=SOFTWARE&mode=tiny&size=5000&offset=0")
}

/// API URL path for a relevance-sorted search restricted to available
/// ZX Spectrum software.
pub fn search_url_path(term: &str) -> String {
    format!(
        "/search?query={term}&mode=tiny&size=256&offset=0&sort=rel_desc&contenttype=SOFTWARE&availability=Available&machinetype=ZXSPECTRUM"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_id_at_game_root() {
        let tid = title_and_id("/by-letter/Q/Quazatron_0003972").unwrap();
        assert_eq!(tid.title, "Quazatron");
        assert_eq!(tid.id.as_str(), "0003972");
        assert_eq!(tid.root, "/by-letter/Q/Quazatron_0003972");
    }

    #[test]
    fn title_and_id_below_game_root() {
        let tid = title_and_id("/by-letter/Q/Quazatron_0003972/POKES/poke1.pok").unwrap();
        assert_eq!(tid.title, "Quazatron");
        assert_eq!(tid.id.as_str(), "0003972");
        assert_eq!(tid.root, "/by-letter/Q/Quazatron_0003972");
    }

    #[test]
    fn title_and_id_ignores_trailing_slashes() {
        let tid = title_and_id("/by-letter/Q/Quazatron_0003972/").unwrap();
        assert_eq!(tid.root, "/by-letter/Q/Quazatron_0003972");
    }

    #[test]
    fn title_and_id_needs_seven_digits() {
        assert!(title_and_id("/by-letter/Q/Quazatron_003972").is_err());
        assert!(title_and_id("/by-letter/Q/Quazatron_00039721x").is_err());
        assert!(title_and_id("/by-letter/Q/Quazatron_123456a").is_err());
    }

    #[test]
    fn title_and_id_splits_at_last_underscore() {
        let tid = title_and_id("/by-letter/T/Three_Weeks_in_Paradise_0005396").unwrap();
        assert_eq!(tid.title, "Three_Weeks_in_Paradise");
        assert_eq!(tid.id.as_str(), "0005396");
    }

    #[test]
    fn title_and_id_rejects_unmarked_paths() {
        assert!(title_and_id("/by-letter/Q").is_err());
        assert!(title_and_id("/").is_err());
        assert!(title_and_id("").is_err());
        assert!(title_and_id("/by-letter/Q/0003972").is_err());
    }

    #[test]
    fn search_term_extraction() {
        assert_eq!(
            search_term("/search/hewson").unwrap(),
            ("hewson".to_string(), String::new())
        );
        assert_eq!(
            search_term("/search/hewson/Zynaps_0005800").unwrap(),
            ("hewson".to_string(), "/Zynaps_0005800".to_string())
        );
        assert_eq!(
            search_term("/search/hewson/Zynaps_0005800/Zynaps.tap.zip").unwrap(),
            (
                "hewson".to_string(),
                "/Zynaps_0005800/Zynaps.tap.zip".to_string()
            )
        );
    }

    #[test]
    fn search_term_requires_a_second_segment() {
        assert!(search_term("/search").is_err());
        assert!(search_term("/nope/hewson").is_err());
    }

    #[test]
    fn basename_edges() {
        assert_eq!(basename("/path0/path1/test"), Some("test"));
        assert_eq!(basename("/path0////path1//"), Some("path1"));
        assert_eq!(basename("/test"), Some("test"));
        assert_eq!(basename("path"), Some("path"));
        assert_eq!(basename("/"), Some("/"));
        assert_eq!(basename(""), None);
    }

    #[test]
    fn dirname_edges() {
        assert_eq!(dirname("/path0/path1/test"), Some("/path0/path1"));
        assert_eq!(dirname("/path0///path1///test"), Some("/path0///path1"));
        assert_eq!(dirname("/test"), Some("/"));
        assert_eq!(dirname("/path0/"), Some("/"));
        assert_eq!(dirname("path"), Some("."));
        assert_eq!(dirname("relative/path"), Some("relative"));
        assert_eq!(dirname("/"), Some("/"));
        assert_eq!(dirname(""), None);
    }

    #[test]
    fn wos_path_fixup() {
        assert_eq!(
            fixup_wos_path("/pub/sinclair/games/x/Xevious.tap.zip"),
            "/games/x/Xevious.tap.zip"
        );
        assert_eq!(
            fixup_wos_path("/games/x/Xevious.tap.zip"),
            "/games/x/Xevious.tap.zip"
        );
    }

    #[test]
    fn download_roots() {
        assert_eq!(
            root_download_url("/zxdb/sinclair/pokes/q/quaz.pok"),
            Some(SPECTRUM_COMPUTING_URL)
        );
        assert_eq!(root_download_url("/games/x/Xevious.tap.zip"), Some(WOS_MIRROR_URL));
        assert_eq!(
            root_download_url("/screens/load/q/scr/quaz.scr"),
            Some(WOS_MIRROR_URL)
        );
        assert_eq!(root_download_url("/somewhere/else.zip"), None);
    }

    #[test]
    fn classify_magic_paths() {
        assert_eq!(classify("/"), PathClass::Root);
        assert_eq!(classify("/by-letter"), PathClass::ByLetterRoot);
        assert_eq!(classify("/by-letter/q"), PathClass::ByLetterIndex('Q'));
        assert_eq!(classify("/by-letter/Z"), PathClass::ByLetterIndex('Z'));
        assert_eq!(classify("/search"), PathClass::SearchRoot);
        assert_eq!(classify("/status"), PathClass::StatusDir);
        assert_eq!(classify("/status/json"), PathClass::StatusFile(StatusKind::Json));
        assert_eq!(
            classify("/status/binary"),
            PathClass::StatusFile(StatusKind::Binary)
        );
    }

    #[test]
    fn classify_cache_controls() {
        assert_eq!(
            classify("/cache/fscache"),
            PathClass::CacheControl(CacheOp::FsCacheDump)
        );
        assert_eq!(
            classify("/cache/fscache/flush"),
            PathClass::CacheControl(CacheOp::FsCacheFlush)
        );
        assert_eq!(
            classify("/cache/urlcache/flush"),
            PathClass::CacheControl(CacheOp::UrlCacheFlush)
        );
        assert_eq!(classify("/cache"), PathClass::CacheControl(CacheOp::Other));
        assert_eq!(
            classify("/cache/bogus"),
            PathClass::CacheControl(CacheOp::Other)
        );
    }

    #[test]
    fn classify_game_and_search() {
        match classify("/by-letter/Q/Quazatron_0003972/POKES") {
            PathClass::GameSubtree(tid) => {
                assert_eq!(tid.root, "/by-letter/Q/Quazatron_0003972");
            }
            other => panic!("unexpected class: {other:?}"),
        }
        assert_eq!(
            classify("/search/hewson"),
            PathClass::SearchTerm("hewson".to_string())
        );
        match classify("/search/hewson/Zynaps_0005800") {
            PathClass::SearchSubtree { term, rest } => {
                assert_eq!(term, "hewson");
                assert_eq!(rest, "/Zynaps_0005800");
            }
            other => panic!("unexpected class: {other:?}"),
        }
        assert_eq!(classify("/bogus/path"), PathClass::Unknown);
    }

    #[test]
    fn url_synthesis() {
        let id = GameId::new("0005795").unwrap();
        assert_eq!(game_url_path(&id), "/games/0005795?mode=compact");
        assert_eq!(
            by_letter_url_path('X'),
            "/games/byletter/X?contenttype=SOFTWARE&mode=tiny&size=5000&offset=0"
        );
        assert!(search_url_path("hewson").starts_with("/search?query=hewson&mode=tiny"));
    }
}
