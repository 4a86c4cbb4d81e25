//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::content::client::DEFAULT_TIMEOUT_SECS;

/// Environment variable holding the content store base URL
pub const ENV_CONTENT_BASE_URL: &str = "BLOG_CONTENT_BASE_URL";
/// Environment variable holding the image base URL
pub const ENV_IMAGE_BASE_URL: &str = "BLOG_IMAGE_BASE_URL";
/// Environment variable holding the preview username
pub const ENV_PREVIEW_USER: &str = "BASIC_AUTH_USER";
/// Environment variable holding the preview password
pub const ENV_PREVIEW_PASSWORD: &str = "BASIC_AUTH_PASSWORD";

/// Problems found while validating configuration at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("content base URL is not set; configure `content.base_url` or {}", ENV_CONTENT_BASE_URL)]
    MissingContentBaseUrl,

    #[error("`{field}` must be an absolute http(s) URL, got {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub external_blog_url: Option<String>,

    // Directory
    pub public_dir: String,

    // Date format
    pub date_format: String,

    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub home: HomeConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            author: String::new(),
            description: String::new(),
            language: "ja".to_string(),
            timezone: "Asia/Tokyo".to_string(),

            url: "http://localhost:4000".to_string(),
            external_blog_url: None,

            public_dir: "public".to_string(),

            date_format: "YYYY/MM/DD".to_string(),

            content: ContentConfig::default(),
            home: HomeConfig::default(),
            preview: PreviewConfig::default(),
            projects: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_CONTENT_BASE_URL) {
            self.content.base_url = Some(v);
        }
        if let Some(v) = get(ENV_IMAGE_BASE_URL) {
            self.content.image_base_url = Some(v);
        }
        if let Some(v) = get(ENV_PREVIEW_USER) {
            self.preview.username = Some(v);
        }
        if let Some(v) = get(ENV_PREVIEW_PASSWORD) {
            self.preview.password = Some(v);
        }
    }

    /// Check everything the server and generator rely on, once, at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self
            .content
            .base_url
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingContentBaseUrl)?;
        check_http_url("content.base_url", base)?;

        if let Some(image_base) = self.content.image_base_url.as_deref() {
            if !image_base.is_empty() {
                check_http_url("content.image_base_url", image_base)?;
            }
        }

        check_http_url("url", &self.url)?;

        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))?;

        Ok(())
    }

    /// Display timezone, falling back to UTC when unknown
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Image base used for placeholder substitution
    pub fn image_base_url(&self) -> &str {
        self.content.image_base_url.as_deref().unwrap_or("")
    }
}

fn check_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
    };
    let url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Remote content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Base URL holding `posts-list.json` and `markdown/`
    pub base_url: Option<String>,
    /// Replaces the image placeholder in post bodies
    pub image_base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            image_base_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Home page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Number of latest posts shown on the home page
    pub latest_posts: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self { latest_posts: 2 }
    }
}

/// Password-protected preview post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub post_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl PreviewConfig {
    /// Route prefix guarded by basic auth, if a preview post is configured
    pub fn path_prefix(&self) -> Option<String> {
        self.post_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(crate::helpers::post_path)
    }

    /// Check a username/password pair against the configured credential
    pub fn accepts(&self, username: &str, password: &str) -> bool {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) => u == username && p == password,
            _ => false,
        }
    }
}

/// A portfolio project card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// GitHub or deployment URL
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.content.base_url = Some("https://cdn.example.com/posts/".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Portfolio");
        assert_eq!(config.home.latest_posts, 2);
        assert_eq!(config.content.request_timeout_secs, 10);
        assert_eq!(config.image_base_url(), "");
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Portfolio
url: https://shoat-portfolio.com
content:
  base_url: https://cdn.example.com/posts/
  image_base_url: https://cdn.example.com/images
home:
  latest_posts: 3
preview:
  post_id: draft-post
projects:
  - id: 1
    title: Site
    description: This site
    tech_stack: [Rust, axum]
    link: https://github.com/example/site
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Portfolio");
        assert_eq!(config.home.latest_posts, 3);
        assert_eq!(config.content.request_timeout_secs, 10);
        assert_eq!(config.image_base_url(), "https://cdn.example.com/images");
        assert_eq!(config.preview.path_prefix().as_deref(), Some("/blog/draft-post"));
        assert_eq!(config.projects[0].tech_stack, vec!["Rust", "axum"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: From File\n").unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "From File");
        assert_eq!(config.timezone, "Asia/Tokyo");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_CONTENT_BASE_URL, "https://env.example.com/"),
            (ENV_IMAGE_BASE_URL, ""),
            (ENV_PREVIEW_USER, "admin"),
            (ENV_PREVIEW_PASSWORD, "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.content.image_base_url = Some("https://file.example.com/".to_string());
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.content.base_url.as_deref(),
            Some("https://env.example.com/")
        );
        // Empty values do not clobber file settings
        assert_eq!(config.image_base_url(), "https://file.example.com/");
        assert!(config.preview.accepts("admin", "secret"));
    }

    #[test]
    fn test_validate_requires_base_url() {
        let config = SiteConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingContentBaseUrl)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = valid_config();
        config.content.base_url = Some("cdn.example.com".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "content.base_url", .. })
        ));

        let mut config = valid_config();
        config.timezone = "Mars/Olympus".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::UnknownTimezone(_))));
        assert_eq!(config.tz(), chrono_tz::UTC);
    }

    #[test]
    fn test_preview_without_credentials_rejects_everyone() {
        let preview = PreviewConfig {
            post_id: Some("draft".to_string()),
            username: None,
            password: None,
        };
        assert!(!preview.accepts("", ""));
        assert!(!preview.accepts("admin", "secret"));
    }
}
