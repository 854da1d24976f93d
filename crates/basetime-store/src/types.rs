//! Scheduled post types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-provided content of a post.
///
/// Serialized in camelCase, matching the persisted collection format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    /// Short title text.
    pub header: String,
    /// Body text.
    pub description: String,
    /// Optional image URL attached to the post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Optional title overlay for the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_header: Option<String>,
    /// Optional caption for the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
}

impl PostContent {
    /// Create text-only content.
    pub fn new(header: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            description: description.into(),
            image: None,
            image_header: None,
            image_description: None,
        }
    }
}

/// Current status of a scheduled post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Awaiting publication; the only state that transitions.
    #[default]
    Pending,
    /// Published successfully. Terminal.
    Posted,
    /// Cancelled by the user. Terminal.
    Cancelled,
}

impl PostStatus {
    /// Whether this status can never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PostStatus::Posted | PostStatus::Cancelled)
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PostStatus::Pending => "pending",
            PostStatus::Posted => "posted",
            PostStatus::Cancelled => "cancelled",
        };
        f.pad(s)
    }
}

/// A post awaiting announcement at a target time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    /// Unique identifier, immutable after creation.
    pub id: String,
    /// The content to publish.
    #[serde(flatten)]
    pub content: PostContent,
    /// When this post becomes eligible for publishing. Immutable.
    pub scheduled_for: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: PostStatus,
    /// When this record was created. Immutable.
    pub created_at: DateTime<Utc>,
}

impl ScheduledPost {
    /// Create a new pending post with a fresh unique id.
    pub fn new(content: PostContent, scheduled_for: DateTime<Utc>) -> Self {
        let created_at = Utc::now();
        Self {
            id: generate_id(created_at),
            content,
            scheduled_for,
            status: PostStatus::Pending,
            created_at,
        }
    }

    /// Check if this post is eligible for publishing as of `now`.
    ///
    /// Only pending posts are ever due; terminal posts stay where they are
    /// regardless of their fire time.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Pending && self.scheduled_for <= now
    }

    /// Check if this post is eligible for publishing right now.
    pub fn is_due(&self) -> bool {
        self.is_due_at(Utc::now())
    }
}

/// Generate a post id from the creation instant plus a random suffix.
///
/// The millisecond prefix keeps ids roughly sortable by creation time; the
/// UUID-derived suffix guarantees uniqueness within and across sessions.
fn generate_id(created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("post_{}_{}", created_at.timestamp_millis(), &suffix[..9])
}
