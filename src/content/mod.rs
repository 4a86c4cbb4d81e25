//! Content module - fetches, parses and renders blog posts

pub mod client;
mod error;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use client::{ContentClient, FetchedResource, DEFAULT_REVALIDATE_SECS};
pub use error::ContentError;
pub use frontmatter::{parse_document, FrontMatter, FrontMatterError, PostMeta};
pub use loader::{ContentLoader, PostIndex};
pub use markdown::{substitute_image_base, MarkdownRenderer, IMAGE_BASE_PLACEHOLDER};
pub use post::{sort_by_date_desc, PostDetail, PostSummary};
