//! Social feed HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use basetime_scheduler::Publisher;
use basetime_store::PostContent;

use crate::format_cast_text;

/// Errors that can occur when posting to the social feed.
#[derive(Debug, Error)]
pub enum SocialError {
    /// The feed rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The feed rejected the cast.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Request body for submitting a cast.
#[derive(Serialize)]
struct CastRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<&'a str>,
}

/// Client for posting casts to the social feed API.
pub struct SocialClient {
    http: Client,
    api_url: String,
    api_token: String,
}

impl SocialClient {
    /// Create a client for the feed API at the given base URL.
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    /// Submit a cast built from the given post content.
    pub async fn publish_cast(&self, content: &PostContent) -> Result<(), SocialError> {
        let text = format_cast_text(content);
        let embeds: Vec<&str> = content.image.as_deref().into_iter().collect();

        let url = format!("{}/casts", self.api_url);
        debug!(url = %url, header = %content.header, "submitting cast");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&CastRequest { text: &text, embeds })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(SocialError::Auth(message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SocialError::Api {
                status: status.as_u16(),
                message,
            });
        }

        info!(header = %content.header, "cast published");
        Ok(())
    }
}

#[async_trait]
impl Publisher for SocialClient {
    async fn publish(&self, content: &PostContent) -> Result<(), String> {
        self.publish_cast(content).await.map_err(|e| e.to_string())
    }
}
