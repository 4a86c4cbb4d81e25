//! List posts from the content store

use anyhow::Result;

use crate::content::{PostIndex, PostSummary};
use crate::Folio;

/// Print every post, newest first
pub async fn run(folio: &Folio) -> Result<()> {
    let loader = folio.content_loader()?;

    let posts = match loader.load_index().await {
        PostIndex::Loaded(posts) => posts,
        PostIndex::Unavailable(e) => anyhow::bail!("Post index unavailable: {}", e),
    };

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!("{}", format_line(post));
    }

    Ok(())
}

fn format_line(post: &PostSummary) -> String {
    match post.updated_on() {
        Some(updated) => format!(
            "  {} - {} [{}] (updated {})",
            post.date, post.title, post.id, updated
        ),
        None => format!("  {} - {} [{}]", post.date, post.title, post.id),
    }
}
