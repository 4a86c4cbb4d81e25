//! Content loader - loads the post index and individual posts from the store

use std::time::Duration;
use url::Url;

use super::client::{ContentClient, DEFAULT_REVALIDATE_SECS};
use super::frontmatter::parse_document;
use super::post::sort_by_date_desc;
use super::{ContentError, PostDetail, PostSummary};
use crate::config::SiteConfig;
use crate::helpers::decode_segment;

/// Index resource, relative to the store base URL
pub const POSTS_LIST_FILE: &str = "posts-list.json";

/// Directory holding one `<id>.md` per post
pub const MARKDOWN_DIR: &str = "markdown";

/// Outcome of loading the post index
///
/// Kept distinct from an empty `Loaded` list so callers can tell
/// "no posts" from "store unavailable" before collapsing.
#[derive(Debug)]
pub enum PostIndex {
    Loaded(Vec<PostSummary>),
    Unavailable(ContentError),
}

impl PostIndex {
    /// Collapse to a list, treating failures as an empty index
    pub fn into_posts(self) -> Vec<PostSummary> {
        match self {
            PostIndex::Loaded(posts) => posts,
            PostIndex::Unavailable(_) => Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, PostIndex::Loaded(_))
    }
}

/// Loads posts from the remote content store
#[derive(Debug, Clone)]
pub struct ContentLoader {
    client: ContentClient,
    revalidate: Duration,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new(client: ContentClient) -> Self {
        Self {
            client,
            revalidate: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
        }
    }

    /// Create a loader from site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self, ContentError> {
        Ok(Self::new(ContentClient::from_config(&config.content)?))
    }

    /// Revalidation window applied to every fetch
    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    /// URL of the post index
    pub fn index_url(&self) -> Result<Url, ContentError> {
        self.client.resource_url(&[POSTS_LIST_FILE])
    }

    /// URL of a post's Markdown file; `id` is percent-decoded first
    pub fn post_url(&self, id: &str) -> Result<Url, ContentError> {
        let file_name = decode_segment(id).ok_or_else(|| ContentError::InvalidId {
            id: id.to_string(),
        })?;
        self.client
            .resource_url(&[MARKDOWN_DIR, &format!("{}.md", file_name)])
    }

    /// Load the index sorted newest first, keeping the failure reason
    pub async fn load_index(&self) -> PostIndex {
        match self.fetch_index().await {
            Ok(posts) => {
                tracing::debug!("Loaded {} posts from index", posts.len());
                PostIndex::Loaded(posts)
            }
            Err(e) => {
                tracing::error!("Error loading post index: {}", e);
                PostIndex::Unavailable(e)
            }
        }
    }

    /// All post summaries sorted newest first; empty on any failure
    pub async fn get_sorted_posts_data(&self) -> Vec<PostSummary> {
        self.load_index().await.into_posts()
    }

    async fn fetch_index(&self) -> Result<Vec<PostSummary>, ContentError> {
        let url = self.index_url()?;
        let resource = self.client.fetch(url, self.revalidate).await?;

        let entries: Vec<serde_json::Value> =
            serde_json::from_str(&resource.body).map_err(|source| ContentError::Index {
                url: resource.url.to_string(),
                source,
            })?;

        // A bad record is dropped on its own; the rest of the index still lists
        let mut posts: Vec<PostSummary> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Skipping index entry {} at {}: {}", i, resource.url, e);
                    None
                }
            })
            .collect();

        sort_by_date_desc(&mut posts);
        Ok(posts)
    }

    /// Load one post by id; every failure names the id
    pub async fn get_post_data(&self, id: &str) -> Result<PostDetail, ContentError> {
        self.fetch_post(id).await.map_err(|e| {
            tracing::error!("Error in get_post_data for ID {}: {}", id, e);
            ContentError::post_unavailable(id, e)
        })
    }

    async fn fetch_post(&self, id: &str) -> Result<PostDetail, ContentError> {
        let url = self.post_url(id)?;
        let resource = self.client.fetch(url, self.revalidate).await?;
        let (meta, body) = parse_document(&resource.body)?;
        Ok(PostDetail::new(id, meta, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::substitute_image_base;
    use httpmock::MockServer;

    fn loader(base: Option<&str>) -> ContentLoader {
        ContentLoader::new(ContentClient::new(base, Duration::from_secs(5)).unwrap())
    }

    fn ids(posts: &[PostSummary]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_index_sorted_newest_first() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET").path("/posts/posts-list.json");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"[{"id":"a","date":"2024-01-01","title":"A"},{"id":"b","date":"2025-01-01","title":"B"}]"#);
            })
            .await;

        let loader = loader(Some(server.url("/posts/").as_str()));
        let posts = loader.get_sorted_posts_data().await;

        mock.assert_async().await;
        assert_eq!(ids(&posts), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_index_keeps_fields_raw() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts-list.json");
                then.status(200).body(
                    r#"[{"id":"a","date":"2024-01-01","update":"2024-01-01","title":"A","description":"teaser"}]"#,
                );
            })
            .await;

        let posts = loader(Some(server.base_url().as_str()))
            .get_sorted_posts_data()
            .await;

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].update.as_deref(), Some("2024-01-01"));
        assert_eq!(posts[0].updated_on(), None);
        assert_eq!(posts[0].description.as_deref(), Some("teaser"));
    }

    #[tokio::test]
    async fn test_index_without_base_url_is_empty() {
        let loader = loader(None);
        let index = loader.load_index().await;
        assert!(matches!(index, PostIndex::Unavailable(ContentError::MissingBaseUrl)));
        assert!(loader.get_sorted_posts_data().await.is_empty());
    }

    #[tokio::test]
    async fn test_index_404_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts-list.json");
                then.status(404);
            })
            .await;

        let loader = loader(Some(server.base_url().as_str()));
        let index = loader.load_index().await;
        assert!(!index.is_loaded());
        assert!(loader.get_sorted_posts_data().await.is_empty());
    }

    #[tokio::test]
    async fn test_index_malformed_json_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts-list.json");
                then.status(200).body(r#"{"not":"a list"}"#);
            })
            .await;

        let loader = loader(Some(server.base_url().as_str()));
        match loader.load_index().await {
            PostIndex::Unavailable(ContentError::Index { url, .. }) => {
                assert!(url.ends_with("/posts-list.json"))
            }
            other => panic!("unexpected index: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_index_skips_bad_entries() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts-list.json");
                then.status(200).body(
                    r#"[{"id":"a","date":"2024-01-01","title":"A"},{"id":"untitled","date":"2024-06-01"},{"id":"c","date":"2025-01-01","title":"C"}]"#,
                );
            })
            .await;

        let index = loader(Some(server.base_url().as_str())).load_index().await;
        assert!(index.is_loaded());
        assert_eq!(ids(&index.into_posts()), vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_empty_index_is_loaded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts-list.json");
                then.status(200).body("[]");
            })
            .await;

        let index = loader(Some(server.base_url().as_str())).load_index().await;
        assert!(index.is_loaded());
        assert!(index.into_posts().is_empty());
    }

    #[tokio::test]
    async fn test_get_post_data() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET").path("/posts/markdown/my-post.md");
                then.status(200).body(
                    "---\ntitle: Hello\ndate: 2024-01-01\nupdate: 2024-01-01\n---\nBody __BLOG_IMAGE__BASE__/x.png",
                );
            })
            .await;

        let loader = loader(Some(server.url("/posts/").as_str()));
        let post = loader.get_post_data("my-post").await.unwrap();

        mock.assert_async().await;
        assert_eq!(post.summary.id, "my-post");
        assert_eq!(post.summary.title, "Hello");
        assert_eq!(post.summary.date, "2024-01-01");
        assert_eq!(post.summary.update.as_deref(), Some("2024-01-01"));
        assert_eq!(post.summary.description, None);
        assert_eq!(post.content, "Body __BLOG_IMAGE__BASE__/x.png");

        assert_eq!(
            substitute_image_base(&post.content, "https://cdn.example.com/"),
            "Body https://cdn.example.com//x.png"
        );
    }

    #[tokio::test]
    async fn test_missing_post_names_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/markdown/missing.md");
                then.status(404);
            })
            .await;

        let err = loader(Some(server.base_url().as_str()))
            .get_post_data("missing")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("missing"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_post_without_base_url_fails() {
        let err = loader(None).get_post_data("any").await.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("any"));
    }

    #[tokio::test]
    async fn test_post_with_invalid_front_matter_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/markdown/untitled.md");
                then.status(200).body("---\ndate: 2024-01-01\n---\nBody");
            })
            .await;

        let err = loader(Some(server.base_url().as_str()))
            .get_post_data("untitled")
            .await
            .unwrap_err();

        match err {
            ContentError::PostUnavailable { id, source } => {
                assert_eq!(id, "untitled");
                assert!(matches!(*source, ContentError::FrontMatter(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts-list.json");
                then.status(200).body("[]").delay(Duration::from_secs(3));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/markdown/slow.md");
                then.status(200)
                    .body("---\ntitle: Slow\ndate: 2024-01-01\n---\nBody")
                    .delay(Duration::from_secs(3));
            })
            .await;

        let client =
            ContentClient::new(Some(server.base_url().as_str()), Duration::from_secs(1)).unwrap();
        let loader = ContentLoader::new(client);

        let started = std::time::Instant::now();
        let index = loader.load_index().await;
        assert!(matches!(index, PostIndex::Unavailable(ContentError::Request { .. })));
        assert!(started.elapsed() < Duration::from_secs(3));

        let err = loader.get_post_data("slow").await.unwrap_err();
        assert!(err.to_string().contains("slow"));
        match err {
            ContentError::PostUnavailable { source, .. } => {
                assert!(matches!(*source, ContentError::Request { .. }))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_post_url_decodes_id() {
        let loader = loader(Some("https://cdn.example.com/posts/"));
        assert_eq!(
            loader.post_url("hello%20world").unwrap().as_str(),
            "https://cdn.example.com/posts/markdown/hello%20world.md"
        );
        assert_eq!(
            loader.post_url("%E6%97%A5%E8%A8%98").unwrap().as_str(),
            "https://cdn.example.com/posts/markdown/%E6%97%A5%E8%A8%98.md"
        );
        // A decoded slash stays inside the markdown directory
        assert_eq!(
            loader.post_url("a%2F..%2Fb").unwrap().as_str(),
            "https://cdn.example.com/posts/markdown/a%2F..%2Fb.md"
        );
        assert!(matches!(
            loader.post_url("%FF"),
            Err(ContentError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_index_url() {
        let loader = loader(Some("https://cdn.example.com/posts/"));
        assert_eq!(
            loader.index_url().unwrap().as_str(),
            "https://cdn.example.com/posts/posts-list.json"
        );
    }
}
