//! Durable scheduled post store for basetime.
//!
//! This crate owns the authoritative collection of to-be-announced posts:
//! - Post records with a `pending` / `posted` / `cancelled` lifecycle
//! - Lifecycle queries (pending, due-as-of-now)
//! - Persistence of the full collection through an injected storage backend

mod error;
mod storage;
mod store;
mod types;

pub use error::StoreError;
pub use storage::{FileStorage, MemoryStorage, SCHEDULED_POSTS_KEY, Storage};
pub use store::ScheduledPostStore;
pub use types::{PostContent, PostStatus, ScheduledPost};
