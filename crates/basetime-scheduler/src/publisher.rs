//! The publishing seam between the scheduler and the social feed.

use async_trait::async_trait;

use basetime_store::PostContent;

/// Posts content to the external social feed.
///
/// Failures are opaque to the scheduler: whatever the cause (authorization,
/// network, platform rejection), a failed attempt just leaves the post
/// pending for the next tick, so errors cross this seam as plain strings.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Attempt to publish the given content. Returns an error description
    /// when the content was not published this attempt.
    async fn publish(&self, content: &PostContent) -> Result<(), String>;
}
