//! Sources for the `/status` diagnostic files.
//!
//! On the handheld image a companion script periodically snapshots WiFi
//! and clock state into a pair of local files; the filesystem surfaces
//! those verbatim as `/status/json` and `/status/binary`. The trait seam
//! lets tests substitute fixed content without touching `/tmp`.

use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};
use zxdbfs_core::paths::StatusKind;
use zxdbfs_types::StatusReport;

pub trait StatusSource: Send + Sync {
    /// Current content of the given status file.
    fn blob(&self, kind: StatusKind) -> io::Result<Vec<u8>>;
}

/// Reads status snapshots from local files.
#[derive(Debug, Clone)]
pub struct FileStatusSource {
    pub json_path: PathBuf,
    pub binary_path: PathBuf,
}

impl FileStatusSource {
    pub fn new(json_path: PathBuf, binary_path: PathBuf) -> Self {
        Self {
            json_path,
            binary_path,
        }
    }
}

impl StatusSource for FileStatusSource {
    fn blob(&self, kind: StatusKind) -> io::Result<Vec<u8>> {
        let path = match kind {
            StatusKind::Json => &self.json_path,
            StatusKind::Binary => &self.binary_path,
        };
        let body = std::fs::read(path)?;
        if kind == StatusKind::Json {
            // sanity-check the snapshot so a stale or truncated file shows
            // up in the logs rather than only in a confused client
            match serde_json::from_slice(&body)
                .map_err(|e| e.to_string())
                .and_then(|doc| StatusReport::from_json(&doc).map_err(|e| e.to_string()))
            {
                Ok(report) => debug!(ssid = %report.wpa_cli.ssid, "status snapshot ok"),
                Err(err) => warn!(path = %path.display(), %err, "status snapshot unparseable"),
            }
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_both_snapshot_files() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("status.txt");
        let binary_path = dir.path().join("status.bin");
        let report = json!({
            "type": "zxdbfsstatus",
            "wpa_cli": {
                "ssid": "testnet",
                "pairwise_cipher": "CCMP",
                "group_cipher": "CCMP",
                "key_mgmt": "WPA2-PSK",
                "wpa_state": "COMPLETED"
            },
            "ntpdok": 1,
            "dateok": 1,
            "zxdbfsdok": 1,
            "spidok": 0,
            "zxdbversion": "1.0.0"
        });
        std::fs::write(&json_path, serde_json::to_vec(&report).unwrap()).unwrap();
        std::fs::write(&binary_path, [0xde, 0xad]).unwrap();

        let source = FileStatusSource::new(json_path, binary_path);
        let json_blob = source.blob(StatusKind::Json).unwrap();
        assert!(!json_blob.is_empty());
        assert_eq!(source.blob(StatusKind::Binary).unwrap(), vec![0xde, 0xad]);
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileStatusSource::new(
            dir.path().join("absent.txt"),
            dir.path().join("absent.bin"),
        );
        assert!(source.blob(StatusKind::Json).is_err());
    }
}
