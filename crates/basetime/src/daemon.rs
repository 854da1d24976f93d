//! Daemon command running the announcement loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use miette::Result;
use tokio::sync::watch;
use tracing::info;

use basetime_scheduler::{DueScheduler, Publisher};
use basetime_social::SocialClient;
use basetime_store::{FileStorage, ScheduledPostStore};

/// Configuration for the daemon.
pub struct DaemonConfig {
    pub api_url: String,
    pub api_token: String,
    pub data_dir: PathBuf,
    /// Seconds between scheduler ticks.
    pub poll_interval: u64,
    /// Seconds allowed per publish attempt.
    pub publish_timeout: u64,
}

/// Run the daemon until interrupted.
pub async fn run(config: DaemonConfig) -> Result<()> {
    info!(data_dir = %config.data_dir.display(), "starting basetime daemon");

    let store = Arc::new(ScheduledPostStore::open(Box::new(FileStorage::new(
        config.data_dir.clone(),
    ))));

    let pending = store.pending_posts().await.len();
    info!(pending, "scheduled post store loaded");

    let publisher: Arc<dyn Publisher> =
        Arc::new(SocialClient::new(&config.api_url, &config.api_token));

    let scheduler = DueScheduler::new(Arc::clone(&store), publisher)
        .with_tick_interval(Duration::from_secs(config.poll_interval))
        .with_publish_timeout(Duration::from_secs(config.publish_timeout));

    // Ctrl-C tears the loop down between batches
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;

    info!("daemon shut down gracefully");
    Ok(())
}
