//! Configuration module

mod site;

pub use site::ConfigError;
pub use site::ContentConfig;
pub use site::HomeConfig;
pub use site::PreviewConfig;
pub use site::Project;
pub use site::SiteConfig;
pub use site::{ENV_CONTENT_BASE_URL, ENV_IMAGE_BASE_URL, ENV_PREVIEW_PASSWORD, ENV_PREVIEW_USER};
