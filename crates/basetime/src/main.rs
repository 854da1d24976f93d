//! BaseTime: scheduled social post announcer
//!
//! Main binary with subcommands:
//! - `daemon`: poll the store and publish due posts
//! - `schedule`: queue a new post for announcement
//! - `list`: show the scheduled post collection
//! - `cancel` / `remove`: retire a post

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use basetime_store::{FileStorage, PostContent, PostStatus, ScheduledPostStore};

mod daemon;

#[derive(Parser)]
#[command(name = "basetime")]
#[command(about = "Scheduled social post announcer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the announcement daemon (due-post polling and publishing)
    Daemon {
        /// Feed API base URL
        #[arg(long, env = "BASETIME_API_URL")]
        api_url: String,

        /// Feed API bearer token
        #[arg(long, env = "BASETIME_API_TOKEN")]
        api_token: String,

        /// Directory holding the scheduled post collection
        #[arg(long, env = "BASETIME_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Poll interval in seconds
        #[arg(long, default_value = "60")]
        poll_interval: u64,

        /// Per-attempt publish timeout in seconds
        #[arg(long, default_value = "30")]
        publish_timeout: u64,
    },

    /// Schedule a new post
    Schedule {
        /// Post title
        #[arg(long)]
        header: String,

        /// Post body
        #[arg(long)]
        description: String,

        /// When to announce: RFC 3339, or "YYYY-MM-DD HH:MM" in UTC
        #[arg(long)]
        at: String,

        /// Image URL to embed
        #[arg(long)]
        image: Option<String>,

        /// Title overlay for the image
        #[arg(long)]
        image_header: Option<String>,

        /// Caption for the image
        #[arg(long)]
        image_description: Option<String>,

        /// Directory holding the scheduled post collection
        #[arg(long, env = "BASETIME_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// List scheduled posts
    List {
        /// Only show posts still awaiting publication
        #[arg(long)]
        pending: bool,

        /// Directory holding the scheduled post collection
        #[arg(long, env = "BASETIME_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Cancel a pending post, keeping its record
    Cancel {
        /// Post id
        id: String,

        /// Directory holding the scheduled post collection
        #[arg(long, env = "BASETIME_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Delete a post from the collection
    Remove {
        /// Post id
        id: String,

        /// Directory holding the scheduled post collection
        #[arg(long, env = "BASETIME_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "basetime=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            api_url,
            api_token,
            data_dir,
            poll_interval,
            publish_timeout,
        } => {
            daemon::run(daemon::DaemonConfig {
                api_url,
                api_token,
                data_dir: resolve_data_dir(data_dir),
                poll_interval,
                publish_timeout,
            })
            .await
        }

        Commands::Schedule {
            header,
            description,
            at,
            image,
            image_header,
            image_description,
            data_dir,
        } => {
            // The store does not re-validate content; this command surface
            // is the caller responsible for it
            if header.trim().is_empty() {
                return Err(miette::miette!("header must not be empty"));
            }
            if description.trim().is_empty() {
                return Err(miette::miette!("description must not be empty"));
            }
            let scheduled_for =
                parse_schedule_time(&at).map_err(|e| miette::miette!("{}", e))?;

            let store = open_store(data_dir);
            let content = PostContent {
                header,
                description,
                image,
                image_header,
                image_description,
            };
            let post = store.add_post(content, scheduled_for).await;
            println!("scheduled {} for {}", post.id, post.scheduled_for);
            Ok(())
        }

        Commands::List { pending, data_dir } => {
            let store = open_store(data_dir);
            let posts = if pending {
                store.pending_posts().await
            } else {
                store.list_posts().await
            };

            if posts.is_empty() {
                println!("no scheduled posts");
            }
            for post in posts {
                println!(
                    "{}  {:<9}  {}  {}",
                    post.id, post.status, post.scheduled_for, post.content.header
                );
            }
            Ok(())
        }

        Commands::Cancel { id, data_dir } => {
            let store = open_store(data_dir);
            match store.list_posts().await.into_iter().find(|p| p.id == id) {
                Some(post) if post.status == PostStatus::Pending => {
                    store.update_status(&id, PostStatus::Cancelled).await;
                    println!("cancelled {}", id);
                }
                Some(post) => println!("{} is already {}", id, post.status),
                None => println!("no post with id {}", id),
            }
            Ok(())
        }

        Commands::Remove { id, data_dir } => {
            let store = open_store(data_dir);
            store.remove_post(&id).await;
            Ok(())
        }
    }
}

/// Open the on-disk store rooted at the resolved data directory.
fn open_store(data_dir: Option<PathBuf>) -> ScheduledPostStore {
    ScheduledPostStore::open(Box::new(FileStorage::new(resolve_data_dir(data_dir))))
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("basetime")
    })
}

/// Parse a schedule time: RFC 3339, or a naive "YYYY-MM-DD HH:MM" treated
/// as UTC.
fn parse_schedule_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(format!(
        "unrecognized time '{}', expected RFC 3339 or 'YYYY-MM-DD HH:MM' (UTC)",
        raw
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_time() {
        let parsed = parse_schedule_time("2026-08-04T18:30:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-08-04T16:30:00+00:00");
    }

    #[test]
    fn test_parse_naive_time_as_utc() {
        let parsed = parse_schedule_time("2026-08-04 18:30").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-08-04T18:30:00+00:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_schedule_time("next tuesday").is_err());
    }
}
