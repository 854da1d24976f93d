//! Due-post polling scheduler for basetime.
//!
//! This crate provides the recurring dispatch loop that:
//! - Queries the post store for due posts on a fixed interval
//! - Publishes each due post sequentially through a `Publisher`
//! - Flips posts to `posted` only on confirmed success, leaving failures
//!   pending so they retry on a later tick
//! - Skips a tick entirely while a previous batch is still in flight

mod publisher;
mod scheduler;

pub use publisher::Publisher;
pub use scheduler::DueScheduler;
