//! Tag service
//!
//! Tag lookups, the tag listing with post counts, and slug generation for
//! tags that posts are about to create.

use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagWithCount};
use anyhow::Context;
use std::sync::Arc;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    #[error("Tag not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// All tags ordered by name, with post counts
    pub async fn list(&self) -> Result<Vec<TagWithCount>, TagServiceError> {
        let tags = self
            .repo
            .list_with_counts()
            .await
            .context("Failed to list tags")?;
        Ok(tags)
    }

    /// Get a tag by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Tag, TagServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag by slug")?
            .ok_or_else(|| TagServiceError::NotFound(slug.to_string()))
    }
}

/// Build unsaved tags (name + generated slug) for the given names
pub fn prepare_tags(names: &[String]) -> Vec<Tag> {
    names
        .iter()
        .map(|name| Tag::new(generate_tag_slug(name), name.clone()))
        .collect()
}

/// Generate a URL-friendly slug from a tag name.
///
/// Lowercases ASCII, keeps non-ASCII letters, turns everything else into
/// single hyphens and trims hyphens from both ends.
pub fn generate_tag_slug(name: &str) -> String {
    let mapped: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric()) {
                c
            } else {
                '-'
            }
        })
        .collect();

    let mut slug = String::with_capacity(mapped.len());
    let mut prev_hyphen = true;
    for c in mapped.chars() {
        if c == '-' {
            if !prev_hyphen {
                slug.push(c);
                prev_hyphen = true;
            }
        } else {
            slug.push(c);
            prev_hyphen = false;
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generate_tag_slug_simple() {
        assert_eq!(generate_tag_slug("Rust"), "rust");
        assert_eq!(generate_tag_slug("Web Development"), "web-development");
    }

    #[test]
    fn test_generate_tag_slug_collapses_punctuation() {
        assert_eq!(generate_tag_slug("  C++ & Rust!! "), "c-rust");
        assert_eq!(generate_tag_slug("snake_case"), "snake-case");
        assert_eq!(generate_tag_slug("!!!"), "");
    }

    #[test]
    fn test_generate_tag_slug_keeps_non_ascii_letters() {
        assert_eq!(generate_tag_slug("Café Culture"), "café-culture");
    }

    #[test]
    fn test_prepare_tags() {
        let tags = prepare_tags(&["Rust Lang".to_string(), "Axum".to_string()]);
        assert_eq!(tags[0].slug, "rust-lang");
        assert_eq!(tags[0].name, "Rust Lang");
        assert_eq!(tags[1].slug, "axum");
    }

    proptest! {
        #[test]
        fn slug_has_no_edge_or_double_hyphens(name in "\\PC{0,40}") {
            let slug = generate_tag_slug(&name);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.contains(' '));
        }
    }
}
