//! zxdbfsd binary
//!
//! Mounts the ZXDB game archive as a read-only FUSE filesystem.
//!
//! ## Usage
//!
//! ```bash
//! zxdbfsd /mnt/zxdb
//! zxdbfsd --zxdb-root-url https://api.zxinfo.dk/v3 --cache-root-dir /var/cache/zxdbfs /mnt/zxdb
//! ```

use anyhow::Context;
use clap::Parser;
use fuser::MountOption;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use zxdbfsd::options::Options;
use zxdbfsd::status::FileStatusSource;
use zxdbfsd::{ZxdbFs, ZxdbFuse};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let opts = Options::parse();

    std::fs::create_dir_all(&opts.cache_root_dir).with_context(|| {
        format!(
            "creating cache directory {}",
            opts.cache_root_dir.display()
        )
    })?;

    let status = FileStatusSource::new(opts.status_json.clone(), opts.status_binary.clone());
    let mountpoint = opts.mountpoint.clone();
    let allow_other = opts.allow_other;
    let fs = ZxdbFs::new(opts, Box::new(status));

    let mut mount_opts = vec![
        MountOption::RO,
        MountOption::FSName("zxdbfs".to_string()),
        MountOption::AutoUnmount,
    ];
    if allow_other {
        mount_opts.push(MountOption::AllowOther);
    }

    info!(mountpoint = %mountpoint.display(), "mounting zxdbfs");
    fuser::mount2(ZxdbFuse::new(fs), &mountpoint, &mount_opts)
        .with_context(|| format!("mounting on {}", mountpoint.display()))?;
    info!("unmounted, exiting");
    Ok(())
}
