//! Image lookup for section previews and material illustrations.
//!
//! A lookup never fails the caller's generation because of the network:
//! transport errors and unsuccessful responses come back as `Ok(None)`.
//! Only a missing credential is an error.

mod brave;

pub use brave::{BraveImageSearch, DEFAULT_ENDPOINT};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The outcome of a successful image lookup.
///
/// `url` is empty when the provider answered but had no matching image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
}

impl ImageResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// A lookup that found nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

/// Trait for image search providers.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Look up the single best image for a query.
    ///
    /// Returns `Ok(Some(_))` when the provider answered, `Ok(None)` when it
    /// could not be reached, and `Err` only for missing configuration.
    async fn lookup(&self, query: &str) -> Result<Option<ImageResult>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
