//! Front-matter parsing and validation

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::helpers::parse_date;

lazy_static! {
    /// A `---` fenced block at the very start of the document; the body begins
    /// after the line holding the closing fence.
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"\A---[ \t]*\r?\n(?:([\s\S]*?)\r?\n)??---[ \t]*(?:\r?\n|\z)").unwrap();
}

/// Front-matter validation failures
#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("front matter is not a YAML mapping: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),

    #[error("field `{field}` is not a recognizable date: {value:?}")]
    InvalidDate { field: &'static str, value: String },
}

/// Custom deserializer that reads any YAML scalar as a string
///
/// Authors write `date: 2024-01-01` or `title: 2024` unquoted; both are
/// kept verbatim instead of failing on the type.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct ScalarString;

    impl<'de> Visitor<'de> for ScalarString {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, or boolean")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(ScalarString)
}

/// Untyped front-matter data as written by the author; other keys are ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub date: Option<String>,
    #[serde(alias = "updated", deserialize_with = "scalar_string")]
    pub update: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub description: Option<String>,
}

/// Validated post metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMeta {
    pub title: String,
    pub date: String,
    pub update: Option<String>,
    pub description: Option<String>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let Some(caps) = FENCED_BLOCK.captures(content) else {
            return Ok((FrontMatter::default(), content));
        };

        let block_end = caps.get(0).map_or(0, |m| m.end());
        let body = &content[block_end..];
        let yaml = caps.get(1).map_or("", |m| m.as_str());

        if yaml.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml)?;
        Ok((fm, body))
    }

    /// Check required fields and produce typed metadata
    pub fn validate(self) -> Result<PostMeta, FrontMatterError> {
        let title = non_empty(self.title).ok_or(FrontMatterError::MissingField("title"))?;
        let date = non_empty(self.date).ok_or(FrontMatterError::MissingField("date"))?;

        if parse_date(&date).is_none() {
            return Err(FrontMatterError::InvalidDate {
                field: "date",
                value: date,
            });
        }

        Ok(PostMeta {
            title,
            date,
            // Passed through raw; an empty value means "never updated"
            update: self.update,
            description: non_empty(self.description),
        })
    }
}

/// Split a post document into validated metadata and Markdown body
pub fn parse_document(content: &str) -> Result<(PostMeta, &str), FrontMatterError> {
    let (fm, body) = FrontMatter::parse(content)?;
    Ok((fm.validate()?, body))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
