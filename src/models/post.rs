//! Blog post model
//!
//! Posts are written by users and carry a set of tags. Clients may send tags
//! either as a comma-separated string (`"rust, web"`) or as a JSON array
//! (`["rust", "web"]`); see [`TagList`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Comment, Tag};

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "author")]
    pub author_id: i64,
    pub published_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: String, content: String, author_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            title,
            content,
            author_id,
            published_date: now,
            updated_at: now,
        }
    }
}

/// Post with its tags, as returned by list endpoints
#[derive(Debug, Clone, Serialize)]
pub struct PostWithTags {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
}

/// Post with tags and comments, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
}

/// Tag names as sent by clients
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    Names(Vec<String>),
    Csv(String),
}

impl TagList {
    /// Trimmed, non-empty tag names in first-seen order, without duplicates
    pub fn names(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            TagList::Names(names) => names.iter().map(String::as_str).collect(),
            TagList::Csv(csv) => csv.split(',').collect(),
        };

        let mut names: Vec<String> = Vec::new();
        for name in raw.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

impl Default for TagList {
    fn default() -> Self {
        TagList::Names(Vec::new())
    }
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: TagList,
}

/// Input for editing a post; `tags`, when present, replaces the tag set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<TagList>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_list_from_csv() {
        let input: CreatePostInput =
            serde_json::from_str(r#"{"title":"t","content":"c","tags":" rust, web ,,rust"}"#)
                .unwrap();
        assert_eq!(input.tags.names(), vec!["rust", "web"]);
    }

    #[test]
    fn test_tag_list_from_array() {
        let input: CreatePostInput =
            serde_json::from_str(r#"{"title":"t","content":"c","tags":["Rust", " ", "Axum"]}"#)
                .unwrap();
        assert_eq!(input.tags.names(), vec!["Rust", "Axum"]);
    }

    #[test]
    fn test_tag_list_missing_is_empty() {
        let input: CreatePostInput =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(input.tags.names().is_empty());

        let update: UpdatePostInput = serde_json::from_str(r#"{"title":"new"}"#).unwrap();
        assert!(update.tags.is_none());
    }
}
