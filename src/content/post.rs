//! Post models

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::frontmatter::PostMeta;
use crate::helpers::{post_path, timestamp_millis};

/// One entry of the post index (`posts-list.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Filename stem, also the route segment
    pub id: String,

    /// Publication date as written by the publisher
    pub date: String,

    /// Last updated date; absent or empty means never updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,

    /// Post title
    pub title: String,

    /// Teaser text for list views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PostSummary {
    /// The update date worth showing, if any
    ///
    /// Suppressed when `update` is absent, empty, or equal to `date`.
    pub fn updated_on(&self) -> Option<&str> {
        self.update
            .as_deref()
            .filter(|u| !u.trim().is_empty() && *u != self.date)
    }

    /// Publication time in milliseconds, `None` if the date does not parse
    pub fn timestamp(&self) -> Option<i64> {
        timestamp_millis(&self.date)
    }

    /// Site-relative route to this post
    pub fn path(&self) -> String {
        post_path(&self.id)
    }
}

/// A full post: summary fields plus the Markdown body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub summary: PostSummary,

    /// Raw Markdown, image placeholder still in place
    pub content: String,
}

impl PostDetail {
    /// Assemble a post from its id, validated metadata and body
    pub fn new(id: &str, meta: PostMeta, body: &str) -> Self {
        Self {
            summary: PostSummary {
                id: id.to_string(),
                date: meta.date,
                update: meta.update,
                title: meta.title,
                description: meta.description,
            },
            content: body.to_string(),
        }
    }
}

/// Sort posts newest first
///
/// Stable, so equal dates keep index order; dates that fail to parse
/// sort after every dated post.
pub fn sort_by_date_desc(posts: &mut [PostSummary]) {
    posts.sort_by_cached_key(|p| Reverse(p.timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, date: &str) -> PostSummary {
        PostSummary {
            id: id.to_string(),
            date: date.to_string(),
            update: None,
            title: id.to_uppercase(),
            description: None,
        }
    }

    fn ids(posts: &[PostSummary]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_sort_newest_first() {
        let mut posts = vec![summary("a", "2024-01-01"), summary("b", "2025-01-01")];
        sort_by_date_desc(&mut posts);
        assert_eq!(ids(&posts), vec!["b", "a"]);
    }

    #[test]
    fn test_sort_mixed_formats_and_ties() {
        let mut posts = vec![
            summary("first-tie", "2024-06-01"),
            summary("slashes", "2024/07/01"),
            summary("second-tie", "2024-06-01T00:00:00Z"),
            summary("evening", "2024-06-01 21:00"),
        ];
        sort_by_date_desc(&mut posts);
        assert_eq!(
            ids(&posts),
            vec!["slashes", "evening", "first-tie", "second-tie"]
        );
    }

    #[test]
    fn test_sort_undated_last() {
        let mut posts = vec![summary("broken", "not a date"), summary("ok", "2020-01-01")];
        sort_by_date_desc(&mut posts);
        assert_eq!(ids(&posts), vec!["ok", "broken"]);
    }

    #[test]
    fn test_updated_marker() {
        let mut post = summary("a", "2024-01-01");
        assert_eq!(post.updated_on(), None);

        post.update = Some(String::new());
        assert_eq!(post.updated_on(), None);

        post.update = Some("2024-01-01".to_string());
        assert_eq!(post.updated_on(), None);

        post.update = Some("2024-03-01".to_string());
        assert_eq!(post.updated_on(), Some("2024-03-01"));
    }

    #[test]
    fn test_deserialize_index_entry() {
        let json = r#"{"id":"hello","date":"2024-01-01","title":"Hello","description":"hi"}"#;
        let post: PostSummary = serde_json::from_str(json).unwrap();
        assert_eq!(post.update, None);
        assert_eq!(post.description.as_deref(), Some("hi"));
        assert_eq!(post.path(), "/blog/hello");

        let json = r#"{"id":"x","date":"2024-01-01","update":null,"title":"X"}"#;
        let post: PostSummary = serde_json::from_str(json).unwrap();
        assert_eq!(post.update, None);
    }

    #[test]
    fn test_detail_serializes_flat() {
        let meta = PostMeta {
            title: "Hello".to_string(),
            date: "2024-01-01".to_string(),
            update: Some("2024-01-01".to_string()),
            description: None,
        };
        let post = PostDetail::new("my-post", meta, "Body");
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["id"], "my-post");
        assert_eq!(value["update"], "2024-01-01");
        assert_eq!(value["content"], "Body");
    }
}
