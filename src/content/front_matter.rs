//! YAML front matter parsing for markdown posts.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("file is empty")]
    EmptyDocument,
    #[error("missing front matter block")]
    MissingBlock,
    #[error("missing or blank title")]
    MissingTitle,
    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Post metadata parsed from the `---` fenced header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: String,
    pub category: Option<String>,
    pub date: Option<String>,
    pub slug: Option<String>,
    pub is_draft: bool,
}

/// Split a post source into parsed front matter and the markdown body.
///
/// The header must be the first thing in the file:
///
/// ```text
/// ---
/// title: My Post
/// date: 2024-06-15
/// ---
///
/// body...
/// ```
pub fn parse(source: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    if source.trim().is_empty() {
        return Err(FrontMatterError::EmptyDocument);
    }
    if !source.starts_with("---") {
        return Err(FrontMatterError::MissingBlock);
    }

    let mut parts = source.splitn(3, "---");
    parts.next(); // leading empty segment before the first fence
    let (Some(header), Some(body)) = (parts.next(), parts.next()) else {
        return Err(FrontMatterError::MissingBlock);
    };

    let meta: FrontMatter = serde_yaml::from_str(header)?;
    if meta.title.trim().is_empty() {
        return Err(FrontMatterError::MissingTitle);
    }

    Ok((meta, body))
}
