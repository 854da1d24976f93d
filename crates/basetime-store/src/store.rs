//! The authoritative scheduled post collection.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::storage::{SCHEDULED_POSTS_KEY, Storage};
use crate::{PostContent, PostStatus, ScheduledPost};

/// Durable collection of scheduled posts with lifecycle queries.
///
/// The store exclusively owns the collection; the scheduler queries it on
/// every tick rather than holding a copy. Every mutating operation persists
/// the full collection through the storage backend.
pub struct ScheduledPostStore {
    storage: Box<dyn Storage>,
    posts: RwLock<Vec<ScheduledPost>>,
}

impl ScheduledPostStore {
    /// Open the store, loading any previously persisted collection.
    ///
    /// A missing or corrupt slot yields an empty collection. Opening never
    /// fails: persistence problems degrade to an empty in-memory store.
    pub fn open(storage: Box<dyn Storage>) -> Self {
        let posts = match storage.read(SCHEDULED_POSTS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ScheduledPost>>(&raw) {
                Ok(posts) => {
                    debug!(count = posts.len(), "loaded scheduled posts");
                    posts
                }
                Err(e) => {
                    warn!(error = %e, "corrupt scheduled post slot, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read scheduled posts, starting empty");
                Vec::new()
            }
        };

        Self {
            storage,
            posts: RwLock::new(posts),
        }
    }

    /// Create a new pending post, append it, and persist the collection.
    ///
    /// The caller is responsible for validating that header and description
    /// are non-empty before scheduling.
    pub async fn add_post(
        &self,
        content: PostContent,
        scheduled_for: DateTime<Utc>,
    ) -> ScheduledPost {
        let post = ScheduledPost::new(content, scheduled_for);

        let mut posts = self.posts.write().await;
        posts.push(post.clone());
        self.persist(&posts);

        info!(id = %post.id, scheduled_for = %post.scheduled_for, "scheduled post added");
        post
    }

    /// Replace the status of the post with the given id, then persist.
    ///
    /// Unknown ids are a silent no-op: the post may already have been
    /// removed by another session sharing the slot.
    pub async fn update_status(&self, id: &str, status: PostStatus) {
        let mut posts = self.posts.write().await;
        if let Some(post) = posts.iter_mut().find(|p| p.id == id) {
            post.status = status;
            self.persist(&posts);
            debug!(id, status = %status, "post status updated");
        }
    }

    /// Delete the post with the given id, then persist. Unknown ids are a
    /// silent no-op.
    pub async fn remove_post(&self, id: &str) {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() != before {
            self.persist(&posts);
            info!(id, "scheduled post removed");
        }
    }

    /// All posts, in insertion order.
    pub async fn list_posts(&self) -> Vec<ScheduledPost> {
        self.posts.read().await.clone()
    }

    /// Posts still awaiting publication, in insertion order.
    pub async fn pending_posts(&self) -> Vec<ScheduledPost> {
        self.posts
            .read()
            .await
            .iter()
            .filter(|p| p.status == PostStatus::Pending)
            .cloned()
            .collect()
    }

    /// Pending posts whose fire time has passed as of `now`.
    pub async fn due_posts_at(&self, now: DateTime<Utc>) -> Vec<ScheduledPost> {
        self.posts
            .read()
            .await
            .iter()
            .filter(|p| p.is_due_at(now))
            .cloned()
            .collect()
    }

    /// Pending posts whose fire time has passed.
    pub async fn due_posts(&self) -> Vec<ScheduledPost> {
        self.due_posts_at(Utc::now()).await
    }

    /// Serialize and write the collection through the backend.
    ///
    /// Failures are logged, never propagated: the in-memory collection
    /// stays authoritative for the rest of the session even if it can no
    /// longer be made durable.
    fn persist(&self, posts: &[ScheduledPost]) {
        let raw = match serde_json::to_string(posts) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to serialize scheduled posts");
                return;
            }
        };

        if let Err(e) = self.storage.write(SCHEDULED_POSTS_KEY, &raw) {
            warn!(error = %e, "failed to persist scheduled posts, keeping in-memory state");
        }
    }
}
