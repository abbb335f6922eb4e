//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

/// Default status snapshot locations, written by the companion status
/// collector on the device image.
pub const DEFAULT_STATUS_JSON: &str = "/tmp/zxdbfsstatus.txt";
pub const DEFAULT_STATUS_BINARY: &str = "/tmp/zxdbfsstatus.bin";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "zxdbfsd",
    about = "Mount the ZXDB game archive as a read-only filesystem"
)]
pub struct Options {
    /// Directory to mount the filesystem on
    pub mountpoint: PathBuf,

    /// Root URL of the ZXDB REST API
    #[arg(long, default_value = "https://api.zxinfo.dk/v3")]
    pub zxdb_root_url: String,

    /// Directory holding persisted by-letter responses
    #[arg(long, default_value = "/tmp/zxdbfscache")]
    pub cache_root_dir: PathBuf,

    /// User-agent presented to the API and the download hosts
    #[arg(long, default_value = "zxdbfs")]
    pub useragent: String,

    /// JSON status snapshot served as /status/json
    #[arg(long, default_value = DEFAULT_STATUS_JSON)]
    pub status_json: PathBuf,

    /// Binary status snapshot served as /status/binary
    #[arg(long, default_value = DEFAULT_STATUS_BINARY)]
    pub status_binary: PathBuf,

    /// Allow other users to access the mount
    #[arg(long)]
    pub allow_other: bool,
}
