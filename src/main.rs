use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use npgallery::config::{default_cache_dir, prune_age, DEFAULT_ROOT};
use npgallery::{GalleryConfig, ThumbnailStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Browse a directory tree over the LAN with cached thumbnails.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Root of the served tree
    #[arg(long, env = "NAS_PATH", default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Thumbnail cache directory
    #[arg(long, env = "GALLERY_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Static frontend directory
    #[arg(long, env = "GALLERY_PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// ffmpeg binary used for video previews
    #[arg(long, env = "GALLERY_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Seconds before a single thumbnail generation is abandoned
    #[arg(long, env = "GALLERY_THUMB_TIMEOUT_SECS", default_value_t = 30)]
    thumb_timeout: u64,

    /// Delete cached thumbnails older than this many days, then start
    #[arg(long)]
    prune_days: Option<u64>,
}

impl Args {
    fn into_config(self) -> GalleryConfig {
        let mut config = GalleryConfig::new(self.root, self.cache_dir.unwrap_or_else(default_cache_dir));
        config.public_dir = self.public_dir;
        config.bind = SocketAddr::from(([0, 0, 0, 0], self.port));
        config.ffmpeg = self.ffmpeg;
        config.generation_timeout = Duration::from_secs(self.thumb_timeout);
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("npgallery=info,tower_http=warn")),
        )
        .init();

    let args = Args::parse();
    let prune_days = args.prune_days;
    let config = args.into_config();

    info!(root = %config.root.display(), cache = %config.cache_dir.display(), "Starting gallery");

    if let Some(days) = prune_days {
        let store = ThumbnailStore::open(&config.cache_dir).context("Unable to open thumbnail cache")?;
        let deleted = store
            .prune_older_than(prune_age(days))
            .await
            .context("Unable to prune thumbnail cache")?;
        info!(deleted, days, "Pruned thumbnail cache");
    }

    npgallery::serve(&config, shutdown_signal())
        .await
        .context("Error with HTTP server")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
