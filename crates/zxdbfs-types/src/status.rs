//! Parsed diagnostics for the magic `/status` files.
//!
//! A companion tool on the appliance emits a JSON blob describing Wi-Fi
//! association, time sync, and process health. The daemon surfaces the raw
//! blob through `/status/json`; this type parses it for display and sanity
//! checks. The blob must carry `"type": "zxdbfsstatus"` and every field —
//! a partial report is treated as no report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status blob parse failures.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("status blob is not tagged zxdbfsstatus")]
    WrongType,
    #[error("malformed status blob: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Wi-Fi association state as reported by `wpa_cli`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiStatus {
    pub ssid: String,
    pub pairwise_cipher: String,
    pub group_cipher: String,
    pub key_mgmt: String,
    pub wpa_state: String,
}

/// The full appliance status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub wpa_cli: WifiStatus,
    pub ntpdok: i64,
    pub dateok: i64,
    pub zxdbfsdok: i64,
    pub spidok: i64,
    pub zxdbversion: String,
}

impl StatusReport {
    /// Parse a status report, enforcing the `zxdbfsstatus` type tag.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, StatusError> {
        match value.get("type").and_then(|t| t.as_str()) {
            Some("zxdbfsstatus") => {}
            _ => return Err(StatusError::WrongType),
        }
        Ok(serde_json::from_value(value.clone())?)
    }
}
