//! Brave Search images API.

use super::{ImageResult, ImageSearch};
use crate::config::ImageSearchSettings;
use crate::error::{LearnieError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_ENDPOINT: &str = "https://api.search.brave.com/res/v1/images/search";
const API_KEY_ENV: &str = "BRAVE_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Image search backed by the Brave images endpoint.
pub struct BraveImageSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct BraveImageResponse {
    #[serde(default)]
    results: Vec<BraveImage>,
}

#[derive(Debug, Deserialize)]
struct BraveImage {
    #[serde(default)]
    properties: Option<BraveImageProperties>,
}

#[derive(Debug, Deserialize)]
struct BraveImageProperties {
    #[serde(default)]
    url: Option<String>,
}

impl BraveImageSearch {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read the API key from `BRAVE_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_KEY_ENV).ok())
    }

    /// Build from settings, falling back to the environment for the key.
    pub fn from_settings(settings: &ImageSearchSettings) -> Self {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok());
        Self::new(api_key)
            .with_endpoint(&settings.endpoint)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// URL of the first result, empty when there are no results.
    async fn fetch_first_url(&self, api_key: &str, query: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("count", "1")])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LearnieError::ImageProvider(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LearnieError::ImageProvider(format!("returned {}", status)));
        }

        let body: BraveImageResponse = response.json().await.map_err(|e| {
            LearnieError::ImageProvider(format!("response could not be read: {}", e))
        })?;

        Ok(body
            .results
            .into_iter()
            .next()
            .and_then(|image| image.properties)
            .and_then(|properties| properties.url)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ImageSearch for BraveImageSearch {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> Result<Option<ImageResult>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            LearnieError::Config(format!("{} is not set", API_KEY_ENV))
        })?;

        debug!("Searching images for: {}", query);

        let url = match self.fetch_first_url(api_key, query).await {
            Ok(url) => url,
            Err(e) => {
                warn!("{}", e);
                return Ok(None);
            }
        };

        if url.is_empty() {
            debug!("No image found for: {}", query);
        }

        Ok(Some(ImageResult::new(url)))
    }

    fn name(&self) -> &str {
        "brave"
    }
}
