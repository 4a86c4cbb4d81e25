//! Generator module - renders site pages and writes the static site

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;

use crate::config::SiteConfig;
use crate::content::{ContentLoader, MarkdownRenderer, PostDetail, PostIndex, PostSummary};
use crate::helpers::{date_xml, encode_segment, full_url_for, local_datetime, parse_naive_date};
use crate::templates::{PostCard, PostView, ProjectCard, SiteData, TemplateRenderer};
use crate::Folio;

/// Renders every page of the site to a string
pub struct PageBuilder {
    config: SiteConfig,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl PageBuilder {
    /// Create a page builder for the given configuration
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            templates: TemplateRenderer::new(config)?,
            markdown: MarkdownRenderer::new(),
        })
    }

    /// Create a base context with common variables
    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(&self.config));
        context
    }

    /// Posts shown in listings; the preview post is never listed
    fn listed<'a>(&'a self, posts: &'a [PostSummary]) -> impl Iterator<Item = &'a PostSummary> {
        posts.iter().filter(move |p| !self.is_preview(&p.id))
    }

    /// Home page: intro plus the latest posts
    pub fn home(&self, posts: &[PostSummary]) -> Result<String> {
        let latest: Vec<PostCard> = self
            .listed(posts)
            .take(self.config.home.latest_posts)
            .map(PostCard::from)
            .collect();

        let mut context = self.base_context();
        context.insert("latest_posts", &latest);
        context.insert("total_posts", &self.listed(posts).count());
        self.templates.render("home.html", &context)
    }

    /// Blog index listing every post
    pub fn blog_index(&self, posts: &[PostSummary]) -> Result<String> {
        let cards: Vec<PostCard> = self.listed(posts).map(PostCard::from).collect();

        let mut context = self.base_context();
        context.insert("posts", &cards);
        self.templates.render("blog.html", &context)
    }

    /// Post detail page
    pub fn post(&self, post: &PostDetail) -> Result<String> {
        let content = self
            .markdown
            .render_post(&post.content, self.config.image_base_url());

        let view = PostView {
            title: post.summary.title.clone(),
            date: post.summary.date.clone(),
            updated: post.summary.updated_on().map(str::to_string),
            description: post.summary.description.clone(),
            content,
        };

        let mut context = self.base_context();
        context.insert("post", &view);
        self.templates.render("post.html", &context)
    }

    /// Projects page
    pub fn projects(&self) -> Result<String> {
        let projects: Vec<ProjectCard> = self.config.projects.iter().map(ProjectCard::from).collect();

        let mut context = self.base_context();
        context.insert("projects", &projects);
        self.templates.render("projects.html", &context)
    }

    /// Not-found page
    pub fn not_found(&self, message: &str) -> Result<String> {
        let mut context = self.base_context();
        context.insert("message", message);
        self.templates.render("not_found.html", &context)
    }

    /// Sitemap XML: the fixed pages plus one entry per public post
    pub fn sitemap(&self, posts: &[PostSummary]) -> String {
        let now = date_xml(&chrono::Utc::now());
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );

        for path in ["/", "/projects", "/blog"] {
            push_sitemap_url(&mut xml, &full_url_for(&self.config.url, path), Some(&now));
        }

        let tz = self.config.tz();
        for post in self.listed(posts) {
            let lastmod = post
                .update
                .as_deref()
                .and_then(|update| sitemap_lastmod(update, &tz));
            push_sitemap_url(
                &mut xml,
                &full_url_for(&self.config.url, &post.path()),
                lastmod.as_deref(),
            );
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Whether `id` is the password-protected preview post
    pub fn is_preview(&self, id: &str) -> bool {
        self.config.preview.post_id.as_deref() == Some(id)
    }
}

/// W3C date for a raw post date; date-only values stay date-only
fn sitemap_lastmod(raw: &str, tz: &chrono_tz::Tz) -> Option<String> {
    if let Some(date) = parse_naive_date(raw) {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    local_datetime(raw, tz).map(|dt| date_xml(&dt))
}

fn push_sitemap_url(xml: &mut String, loc: &str, lastmod: Option<&str>) {
    xml.push_str("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(loc)));
    if let Some(lastmod) = lastmod {
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", xml_escape(lastmod)));
    }
    xml.push_str("  </url>\n");
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Summary of one static generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub skipped: usize,
    pub index_loaded: bool,
}

/// Static site generator
pub struct Generator {
    public_dir: PathBuf,
    pages: PageBuilder,
    loader: ContentLoader,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Folio) -> Result<Self> {
        Ok(Self {
            public_dir: site.public_dir.clone(),
            pages: PageBuilder::new(&site.config)?,
            loader: site.content_loader()?,
        })
    }

    /// Fetch all content and write the entire site
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.public_dir))?;

        let index = self.loader.load_index().await;
        let index_loaded = index.is_loaded();
        if let PostIndex::Unavailable(e) = &index {
            tracing::warn!("Post index unavailable, generating without posts: {}", e);
        }
        let posts = index.into_posts();

        self.write("index.html", &self.pages.home(&posts)?)?;
        self.write("blog/index.html", &self.pages.blog_index(&posts)?)?;
        self.write("projects/index.html", &self.pages.projects()?)?;
        self.write("404.html", &self.pages.not_found("Page not found")?)?;
        self.write("sitemap.xml", &self.pages.sitemap(&posts))?;

        let mut stats = GenerateStats {
            index_loaded,
            ..Default::default()
        };

        for summary in &posts {
            if self.pages.is_preview(&summary.id) {
                tracing::info!("Skipping preview post {}", summary.id);
                stats.skipped += 1;
                continue;
            }
            if !is_safe_dir_name(&summary.id) {
                tracing::warn!("Skipping post with unusable id {:?}", summary.id);
                stats.skipped += 1;
                continue;
            }

            // The loader takes the route form of the id
            let post = self
                .loader
                .get_post_data(&encode_segment(&summary.id))
                .await
                .with_context(|| format!("Failed to generate post {}", summary.id))?;

            let relative = Path::new("blog").join(&summary.id).join("index.html");
            self.write(&relative, &self.pages.post(&post)?)?;
            stats.posts += 1;
        }

        Ok(stats)
    }

    fn write<P: AsRef<Path>>(&self, relative: P, content: &str) -> Result<()> {
        let output_path = self.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, content)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

/// A post id usable as a single directory name
fn is_safe_dir_name(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}
