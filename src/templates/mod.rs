//! Built-in site templates using Tera template engine
//!
//! All templates are embedded directly in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{Project, SiteConfig};
use crate::content::PostSummary;
use crate::helpers::display_date;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    ///
    /// Autoescaping stays on for `.html` templates: titles and descriptions
    /// come from the remote store. Rendered post bodies are marked `safe`.
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("projects.html", include_str!("site/projects.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/footer.html",
                include_str!("site/partials/footer.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("site/partials/post_card.html"),
            ),
        ])?;

        // Register custom filters
        tera.register_filter("truncate_chars", truncate_chars_filter);

        let tz = config.tz();
        let date_format = config.date_format.clone();
        tera.register_filter(
            "date_format",
            move |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                let s = tera::try_get_value!("date_format", "value", String, value);
                let format = match args.get("format") {
                    Some(val) => tera::try_get_value!("date_format", "format", String, val),
                    None => date_format.clone(),
                };
                Ok(tera::Value::String(display_date(&s, &format, &tz)))
            },
        );

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "…".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
    pub url: String,
    pub external_blog_url: Option<String>,
    pub year: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        let now = chrono::Utc::now().with_timezone(&config.tz());
        Self {
            title: config.title.clone(),
            author: config.author.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            external_blog_url: config.external_blog_url.clone(),
            year: now.format("%Y").to_string(),
        }
    }
}

/// A post as shown in lists; dates stay raw and go through `date_format`
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub date: String,
    pub updated: Option<String>,
    pub description: Option<String>,
    pub path: String,
}

impl From<&PostSummary> for PostCard {
    fn from(post: &PostSummary) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            date: post.date.clone(),
            updated: post.updated_on().map(str::to_string),
            description: post.description.clone(),
            path: post.path(),
        }
    }
}

/// A post detail page
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub date: String,
    pub updated: Option<String>,
    pub description: Option<String>,
    /// Rendered HTML body
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectCard<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub tech_stack: &'a [String],
    pub link: &'a str,
}

impl<'a> From<&'a Project> for ProjectCard<'a> {
    fn from(project: &'a Project) -> Self {
        Self {
            title: &project.title,
            description: &project.description,
            category: &project.category,
            tech_stack: &project.tech_stack,
            link: &project.link,
        }
    }
}
