//! Compiled post model handed to templates and the feed.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::{front_matter, markdown};
use crate::utils::date::DateTimeUtc;
use crate::utils::{html, slug};

/// Average silent reading speed used for the reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// One fully compiled post.
///
/// Display fields (labels, year, reading time) are precomputed here so the
/// templates stay logic-free.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub category_upper: String,
    /// Rendered HTML body.
    pub content: String,
    /// `"Jun 15"` style label for listings.
    pub date_label: String,
    /// `"the 15th of June, 2024"` style label for the post page.
    pub date_formal: String,
    /// RFC 3339 timestamp, for `<time datetime=...>`.
    pub created_at: String,
    pub year: u16,
    /// Estimated minutes to read, always at least 1.
    pub reading_time: usize,
    pub is_draft: bool,
    #[serde(skip)]
    pub date: DateTimeUtc,
}

impl Post {
    /// Compile a single markdown source file.
    pub fn from_file(path: &Path, config: &SiteConfig) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let (meta, body) = front_matter::parse(&source)?;

        let title = meta.title.trim().to_string();
        let slug = match meta.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => slug::slugify(&title),
        };
        if slug.is_empty() {
            bail!("title {title:?} produces an empty slug");
        }

        let date = resolve_date(meta.date.as_deref(), path)?;
        let content = markdown::render(body, &config.site.base_path);

        let words = html::word_count(&content);
        let reading_time = (words / WORDS_PER_MINUTE).max(1);

        let category = meta
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "life".to_string());

        Ok(Post {
            category_upper: category.to_uppercase(),
            category,
            content,
            date_label: date.to_label(),
            date_formal: date.to_formal_label(),
            created_at: date.to_rfc3339(),
            year: date.year,
            reading_time,
            is_draft: meta.is_draft,
            title,
            slug,
            date,
        })
    }
}

/// Front matter date if present and valid, else the file's mtime.
fn resolve_date(from_meta: Option<&str>, path: &Path) -> Result<DateTimeUtc> {
    if let Some(raw) = from_meta {
        return DateTimeUtc::parse(raw)
            .with_context(|| format!("invalid date {raw:?} in {}", path.display()));
    }

    let mtime = fs::metadata(path)?.modified()?;
    let secs = mtime
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    DateTimeUtc::from_unix_timestamp(secs)
        .with_context(|| format!("mtime of {} is out of range", path.display()))
}

/// Posts of one calendar year, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct YearGroup {
    pub year: u16,
    pub count: usize,
    pub posts: Vec<Post>,
}

/// Group an already newest-first post list by year, newest year first.
pub fn group_by_year(posts: &[Post]) -> Vec<YearGroup> {
    let mut groups: Vec<YearGroup> = Vec::new();
    for post in posts {
        match groups.last_mut() {
            Some(group) if group.year == post.year => {
                group.count += 1;
                group.posts.push(post.clone());
            }
            _ => groups.push(YearGroup {
                year: post.year,
                count: 1,
                posts: vec![post.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::fs;
    use tempfile::TempDir;

    fn compile(body: &str) -> Result<Post> {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("post.md");
        fs::write(&path, body).unwrap();
        let config = test_parse_config("");
        Post::from_file(&path, &config)
    }

    #[test]
    fn test_compile_basic_post() {
        let post = compile(
            "---\ntitle: A Post About Things\ndate: 2024-06-15\n---\n\nSome **bold** prose.\n",
        )
        .unwrap();
        assert_eq!(post.slug, "a-post-about-things");
        assert_eq!(post.year, 2024);
        assert_eq!(post.date_label, "Jun 15");
        assert!(post.content.contains("<strong>bold</strong>"));
        assert_eq!(post.reading_time, 1);
    }

    #[test]
    fn test_category_defaults_to_life() {
        let post = compile("---\ntitle: Uncategorized\ndate: 2024-01-01\n---\nbody").unwrap();
        assert_eq!(post.category, "life");
        assert_eq!(post.category_upper, "LIFE");
    }

    #[test]
    fn test_explicit_category_kept() {
        let post =
            compile("---\ntitle: T\ncategory: notes\ndate: 2024-01-01\n---\nbody").unwrap();
        assert_eq!(post.category, "notes");
        assert_eq!(post.category_upper, "NOTES");
    }

    #[test]
    fn test_explicit_slug_wins() {
        let post =
            compile("---\ntitle: Some Title\nslug: custom-path\ndate: 2024-01-01\n---\nbody")
                .unwrap();
        assert_eq!(post.slug, "custom-path");
    }

    #[test]
    fn test_invalid_date_is_error() {
        assert!(compile("---\ntitle: T\ndate: not-a-date\n---\nbody").is_err());
    }

    #[test]
    fn test_missing_date_falls_back_to_mtime() {
        let post = compile("---\ntitle: Undated\n---\nbody").unwrap();
        // mtime of a file written just now
        assert!(post.year >= 2024);
    }

    #[test]
    fn test_unsluggable_title_is_error() {
        assert!(compile("---\ntitle: \"!!!\"\n---\nbody").is_err());
    }

    #[test]
    fn test_group_by_year() {
        let mk = |year, slug: &str| Post {
            title: slug.to_string(),
            slug: slug.to_string(),
            category: "writing".into(),
            category_upper: "WRITING".into(),
            content: String::new(),
            date_label: String::new(),
            date_formal: String::new(),
            created_at: String::new(),
            year,
            reading_time: 1,
            is_draft: false,
            date: DateTimeUtc::parse(&format!("{year}-06-01")).unwrap(),
        };
        let posts = vec![mk(2025, "c"), mk(2024, "b"), mk(2024, "a")];
        let groups = group_by_year(&posts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].year, 2025);
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[1].year, 2024);
        assert_eq!(groups[1].count, 2);
        assert_eq!(groups[1].posts[0].slug, "b");
    }
}
