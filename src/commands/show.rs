//! Show a single post

use anyhow::Result;

use crate::content::MarkdownRenderer;
use crate::Folio;

/// Print one post's metadata followed by its body
///
/// The body is printed as Markdown with images resolved, or as HTML
/// when `html` is set.
pub async fn run(folio: &Folio, id: &str, html: bool) -> Result<()> {
    let loader = folio.content_loader()?;
    let post = loader.get_post_data(id).await?;
    let image_base = folio.config.image_base_url();

    println!("Title: {}", post.summary.title);
    println!("Date: {}", post.summary.date);
    if let Some(updated) = post.summary.updated_on() {
        println!("Updated: {}", updated);
    }
    if let Some(description) = &post.summary.description {
        println!("Description: {}", description);
    }
    println!();

    if html {
        println!("{}", MarkdownRenderer::new().render_post(&post.content, image_base));
    } else {
        println!("{}", crate::content::substitute_image_base(&post.content, image_base));
    }

    Ok(())
}
