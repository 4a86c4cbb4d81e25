//! Content pipeline errors

use thiserror::Error;

use super::frontmatter::FrontMatterError;

/// Errors raised while fetching or parsing content from the store
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("content base URL is not set; configure `content.base_url` or BLOG_CONTENT_BASE_URL")]
    MissingBaseUrl,

    #[error("invalid content base URL {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Content not found or inaccessible: {url} (status {status})")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid post index at {url}: {source}")]
    Index {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("post id {id:?} is not valid percent-encoded UTF-8")]
    InvalidId { id: String },

    #[error("invalid front matter: {0}")]
    FrontMatter(#[from] FrontMatterError),

    #[error("Post not found or inaccessible: {id}")]
    PostUnavailable {
        id: String,
        #[source]
        source: Box<ContentError>,
    },
}

impl ContentError {
    /// Wrap any error as a failure to load the post `id`
    pub fn post_unavailable(id: &str, source: ContentError) -> Self {
        match source {
            already @ ContentError::PostUnavailable { .. } => already,
            other => ContentError::PostUnavailable {
                id: id.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Whether the store answered with 404 somewhere in the chain
    pub fn is_not_found(&self) -> bool {
        match self {
            ContentError::Status { status, .. } => *status == reqwest::StatusCode::NOT_FOUND,
            ContentError::PostUnavailable { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether this is a configuration problem rather than a content problem
    pub fn is_configuration(&self) -> bool {
        match self {
            ContentError::MissingBaseUrl | ContentError::InvalidBaseUrl { .. } => true,
            ContentError::PostUnavailable { source, .. } => source.is_configuration(),
            _ => false,
        }
    }
}
