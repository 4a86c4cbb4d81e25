//! HTTP access to the remote content store

use reqwest::header::CACHE_CONTROL;
use std::time::Duration;
use url::Url;

use super::ContentError;
use crate::config::ContentConfig;

/// Revalidation window requested for every content fetch
pub const DEFAULT_REVALIDATE_SECS: u64 = 60;

/// Request timeout used when the configuration does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A successfully fetched resource
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: Url,
    pub body: String,
    /// How long a cache in front of us may serve this before re-checking
    pub revalidate: Duration,
}

/// Fetch-with-revalidate client bound to one content store origin
#[derive(Debug, Clone)]
pub struct ContentClient {
    base_url: Option<Url>,
    http: reqwest::Client,
}

impl ContentClient {
    /// Create a client; a missing base URL is only reported when fetching
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, ContentError> {
        let base_url = base_url.map(parse_base_url).transpose()?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ContentError::Client)?;

        Ok(Self { base_url, http })
    }

    /// Create a client from the `content` section of the site config
    pub fn from_config(config: &ContentConfig) -> Result<Self, ContentError> {
        Self::new(
            config.base_url.as_deref().filter(|v| !v.trim().is_empty()),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// The configured store origin
    pub fn base_url(&self) -> Result<&Url, ContentError> {
        self.base_url.as_ref().ok_or(ContentError::MissingBaseUrl)
    }

    /// Build `<base>/<segment>/<segment>...`, encoding each segment
    pub fn resource_url(&self, segments: &[&str]) -> Result<Url, ContentError> {
        let mut url = self.base_url()?.clone();
        // parse_base_url already rejected cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// GET a resource, asking caches to revalidate no more often than `revalidate`
    pub async fn fetch(&self, url: Url, revalidate: Duration) -> Result<FetchedResource, ContentError> {
        if self.base_url.is_none() {
            tracing::error!("Refusing to fetch {}: content base URL is not set", url);
            return Err(ContentError::MissingBaseUrl);
        }

        tracing::info!("Fetching {} (revalidate {}s)", url, revalidate.as_secs());

        let response = self
            .http
            .get(url.clone())
            .header(CACHE_CONTROL, format!("max-age={}", revalidate.as_secs()))
            .send()
            .await
            .map_err(|source| {
                tracing::error!("Failed to fetch {}: {}", url, source);
                ContentError::Request {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Failed to fetch {}. Status: {}", url, status);
            return Err(ContentError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ContentError::Request {
                url: url.to_string(),
                source,
            })?;

        Ok(FetchedResource {
            url,
            body,
            revalidate,
        })
    }
}

/// Accept absolute http(s) URLs only
fn parse_base_url(value: &str) -> Result<Url, ContentError> {
    let invalid = |reason: String| ContentError::InvalidBaseUrl {
        value: value.to_string(),
        reason,
    };

    let mut url = Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }
    url.set_fragment(None);
    Ok(url)
}
