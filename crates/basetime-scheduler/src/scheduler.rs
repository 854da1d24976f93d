//! Due-post scheduler implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use basetime_store::{PostStatus, ScheduledPostStore};

use crate::Publisher;

/// Default interval between scheduler ticks.
const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Default bound on a single publish attempt.
const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 30;

/// Periodically discovers due posts and publishes them.
///
/// Each tick queries the store for due posts and dispatches them
/// sequentially. A post flips to `posted` only after the publisher confirms
/// success; failed and timed-out attempts leave it pending, so it is
/// retried on the next tick for as long as it stays due. An in-flight flag
/// makes a tick that overlaps a still-running batch skip entirely rather
/// than queue, so a slow publisher can delay work but never duplicate it.
pub struct DueScheduler {
    store: Arc<ScheduledPostStore>,
    publisher: Arc<dyn Publisher>,
    tick_interval: Duration,
    publish_timeout: Duration,
    in_flight: AtomicBool,
}

impl DueScheduler {
    /// Create a scheduler over the given store and publisher.
    pub fn new(store: Arc<ScheduledPostStore>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            store,
            publisher,
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            publish_timeout: Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Override the interval between ticks.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Override the bound on a single publish attempt.
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Run the scheduler loop until the shutdown signal fires.
    ///
    /// The first interval tick completes immediately, so posts already due
    /// after a (re)start are dispatched without waiting a full interval.
    /// Shutdown lands between batches; a started batch runs to completion.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.tick_interval.as_secs(),
            "scheduler starting"
        );

        let mut interval = tokio::time::interval(self.tick_interval);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("scheduler shut down");
    }

    /// Run a single scheduling pass.
    ///
    /// Nothing escapes a tick: publish failures are logged and contained
    /// per post, and one failing post never aborts the rest of the batch.
    pub async fn tick(&self) {
        // A batch from an earlier tick may still be awaiting the publisher
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("previous batch still in flight, skipping tick");
            return;
        }

        let due = self.store.due_posts().await;
        if due.is_empty() {
            self.in_flight.store(false, Ordering::SeqCst);
            return;
        }

        info!(count = due.len(), "dispatching due posts");

        // Strictly sequential: each attempt is awaited before the next, so
        // a batch never amplifies load on the feed API
        for post in due {
            match timeout(self.publish_timeout, self.publisher.publish(&post.content)).await {
                Ok(Ok(())) => {
                    info!(id = %post.id, header = %post.content.header, "post published");
                    self.store.update_status(&post.id, PostStatus::Posted).await;
                }
                Ok(Err(error)) => {
                    warn!(
                        id = %post.id,
                        error = %error,
                        "publish failed, post stays pending for retry"
                    );
                }
                Err(_) => {
                    warn!(
                        id = %post.id,
                        timeout_secs = self.publish_timeout.as_secs(),
                        "publish timed out, post stays pending for retry"
                    );
                }
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use basetime_store::{MemoryStorage, PostContent};
    use chrono::{Duration as ChronoDuration, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Publisher that records every content it was asked to publish.
    #[derive(Default)]
    struct RecordingPublisher {
        calls: Mutex<Vec<PostContent>>,
    }

    impl RecordingPublisher {
        fn call_count(&self) -> usize {
            self.calls.lock().expect("poisoned lock").len()
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, content: &PostContent) -> Result<(), String> {
            self.calls.lock().expect("poisoned lock").push(content.clone());
            Ok(())
        }
    }

    /// Publisher that fails its first attempt and succeeds afterwards.
    #[derive(Default)]
    struct FlakyPublisher {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Publisher for FlakyPublisher {
        async fn publish(&self, _content: &PostContent) -> Result<(), String> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("feed API rejected the cast".to_string())
            } else {
                Ok(())
            }
        }
    }

    /// Publisher that blocks until released, for overlap tests.
    #[derive(Default)]
    struct BlockingPublisher {
        calls: AtomicUsize,
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Publisher for BlockingPublisher {
        async fn publish(&self, _content: &PostContent) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    /// Publisher whose attempts never resolve.
    struct StuckPublisher;

    #[async_trait]
    impl Publisher for StuckPublisher {
        async fn publish(&self, _content: &PostContent) -> Result<(), String> {
            std::future::pending().await
        }
    }

    async fn seeded_store(posts: &[(&str, ChronoDuration)]) -> Arc<ScheduledPostStore> {
        let store = Arc::new(ScheduledPostStore::open(Box::new(MemoryStorage::new())));
        for (header, offset) in posts {
            let content = PostContent::new(*header, format!("{} body", header));
            store.add_post(content, Utc::now() + *offset).await;
        }
        store
    }

    #[tokio::test]
    async fn test_due_post_published_exactly_once() {
        let store = seeded_store(&[("launch", -ChronoDuration::minutes(1))]).await;
        let publisher = Arc::new(RecordingPublisher::default());
        let scheduler = DueScheduler::new(
            Arc::clone(&store),
            Arc::clone(&publisher) as Arc<dyn Publisher>,
        );

        scheduler.tick().await;

        let calls = publisher.calls.lock().expect("poisoned lock").clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].header, "launch");
        assert_eq!(calls[0].description, "launch body");
        assert_eq!(store.list_posts().await[0].status, PostStatus::Posted);

        // The post is no longer due, so the next tick is a no-op
        scheduler.tick().await;
        assert_eq!(publisher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_future_post_is_left_alone() {
        let store = seeded_store(&[("later", ChronoDuration::hours(1))]).await;
        let publisher = Arc::new(RecordingPublisher::default());
        let scheduler = DueScheduler::new(
            Arc::clone(&store),
            Arc::clone(&publisher) as Arc<dyn Publisher>,
        );

        scheduler.tick().await;

        assert_eq!(publisher.call_count(), 0);
        assert_eq!(store.list_posts().await[0].status, PostStatus::Pending);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_batch() {
        let store = seeded_store(&[
            ("first", -ChronoDuration::minutes(2)),
            ("second", -ChronoDuration::minutes(1)),
        ]).await;
        let publisher = Arc::new(FlakyPublisher::default());
        let scheduler = DueScheduler::new(
            Arc::clone(&store),
            Arc::clone(&publisher) as Arc<dyn Publisher>,
        );

        scheduler.tick().await;

        let posts = store.list_posts().await;
        assert_eq!(posts[0].status, PostStatus::Pending);
        assert_eq!(posts[1].status, PostStatus::Posted);
        assert_eq!(publisher.attempts.load(Ordering::SeqCst), 2);

        // The failed post is still due, so the next tick retries it
        scheduler.tick().await;
        let posts = store.list_posts().await;
        assert_eq!(posts[0].status, PostStatus::Posted);
        assert_eq!(publisher.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let store = seeded_store(&[("slow", -ChronoDuration::minutes(1))]).await;
        let publisher = Arc::new(BlockingPublisher::default());
        let scheduler = Arc::new(DueScheduler::new(
            Arc::clone(&store),
            Arc::clone(&publisher) as Arc<dyn Publisher>,
        ));

        let tick_a = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.tick().await })
        };

        // Wait until tick A's batch is inside the publisher
        publisher.started.notified().await;

        // Tick B finds the batch in flight and must not publish anything
        scheduler.tick().await;
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);

        publisher.release.notify_one();
        tick_a.await.expect("tick task panicked");

        assert_eq!(store.list_posts().await[0].status, PostStatus::Posted);

        // With the batch finished the guard is clear again; the post is
        // already published so this tick is a clean no-op
        scheduler.tick().await;
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_timeout_counts_as_failure() {
        let store = seeded_store(&[("hung", -ChronoDuration::minutes(1))]).await;
        let scheduler = DueScheduler::new(Arc::clone(&store), Arc::new(StuckPublisher))
            .with_publish_timeout(Duration::from_secs(5));

        scheduler.tick().await;

        // The attempt was bounded and the post is still pending for retry
        assert_eq!(store.list_posts().await[0].status, PostStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_dispatches_at_startup_and_on_interval() {
        let store = seeded_store(&[("immediate", -ChronoDuration::minutes(1))]).await;
        let publisher = Arc::new(RecordingPublisher::default());
        let scheduler = Arc::new(
            DueScheduler::new(
                Arc::clone(&store),
                Arc::clone(&publisher) as Arc<dyn Publisher>,
            )
            .with_tick_interval(Duration::from_secs(60)),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let loop_handle = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run(shutdown_rx).await })
        };

        // The startup tick fires without waiting a full interval
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(publisher.call_count(), 1);

        // A post becoming due is picked up by a later tick
        store
            .add_post(
                PostContent::new("next", "next body"),
                Utc::now() - ChronoDuration::seconds(1),
            )
            .await;
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(publisher.call_count(), 2);

        shutdown_tx.send(true).expect("scheduler loop gone");
        loop_handle.await.expect("scheduler task panicked");
    }
}
