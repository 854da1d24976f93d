//! Social feed publishing for basetime.
//!
//! Formats scheduled post content as a cast and submits it to the feed API
//! over HTTP. The client implements the scheduler's `Publisher` seam.

mod client;
mod format;

pub use client::{SocialClient, SocialError};
pub use format::format_cast_text;
