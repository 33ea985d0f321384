//! Book model
//!
//! Books belong to exactly one author. The list endpoint narrows books with a
//! [`BookFilter`]: exact-match filters, a free-text search over the title and
//! the author's name, and one of four [`BookOrdering`]s.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Book entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub publication_year: i32,
    /// Owning author's id (serialized as `author`)
    #[serde(rename = "author")]
    pub author_id: i64,
}

/// Input for creating a book
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookInput {
    pub title: String,
    pub publication_year: i32,
    #[serde(rename = "author")]
    pub author_id: i64,
}

/// Partial update for a book; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookInput {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    #[serde(rename = "author")]
    pub author_id: Option<i64>,
}

/// Sort order for book listings. Ties are always broken by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookOrdering {
    #[default]
    TitleAsc,
    TitleDesc,
    PublicationYearAsc,
    PublicationYearDesc,
}

impl BookOrdering {
    /// SQL `ORDER BY` clause body for the `b` alias of the books table
    pub fn as_sql(&self) -> &'static str {
        match self {
            BookOrdering::TitleAsc => "b.title ASC, b.id ASC",
            BookOrdering::TitleDesc => "b.title DESC, b.id ASC",
            BookOrdering::PublicationYearAsc => "b.publication_year ASC, b.id ASC",
            BookOrdering::PublicationYearDesc => "b.publication_year DESC, b.id ASC",
        }
    }

    /// Parse an `ordering` query value, falling back to the default order for
    /// anything unrecognised.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for BookOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookOrdering::TitleAsc => write!(f, "title"),
            BookOrdering::TitleDesc => write!(f, "-title"),
            BookOrdering::PublicationYearAsc => write!(f, "publication_year"),
            BookOrdering::PublicationYearDesc => write!(f, "-publication_year"),
        }
    }
}

impl FromStr for BookOrdering {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(BookOrdering::TitleAsc),
            "-title" => Ok(BookOrdering::TitleDesc),
            "publication_year" => Ok(BookOrdering::PublicationYearAsc),
            "-publication_year" => Ok(BookOrdering::PublicationYearDesc),
            _ => Err(anyhow::anyhow!("Invalid ordering: {}", s)),
        }
    }
}

/// Criteria for listing books.
///
/// Exact filters are AND-ed together. `search` matches the title OR the
/// author's name, case-insensitively, and is AND-ed with the filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub author_id: Option<i64>,
    pub search: Option<String>,
    pub ordering: BookOrdering,
}

impl BookFilter {
    /// Search term with surrounding whitespace removed, or `None` if blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse() {
        assert_eq!("title".parse::<BookOrdering>().unwrap(), BookOrdering::TitleAsc);
        assert_eq!(
            "-publication_year".parse::<BookOrdering>().unwrap(),
            BookOrdering::PublicationYearDesc
        );
        assert!("author".parse::<BookOrdering>().is_err());
    }

    #[test]
    fn test_ordering_unknown_falls_back_to_title() {
        assert_eq!(BookOrdering::parse_or_default(None), BookOrdering::TitleAsc);
        assert_eq!(
            BookOrdering::parse_or_default(Some("-id")),
            BookOrdering::TitleAsc
        );
        assert_eq!(
            BookOrdering::parse_or_default(Some(" -title ")),
            BookOrdering::TitleDesc
        );
    }

    #[test]
    fn test_ordering_display_matches_query_value() {
        for ordering in [
            BookOrdering::TitleAsc,
            BookOrdering::TitleDesc,
            BookOrdering::PublicationYearAsc,
            BookOrdering::PublicationYearDesc,
        ] {
            assert_eq!(ordering.to_string().parse::<BookOrdering>().unwrap(), ordering);
        }
    }

    #[test]
    fn test_search_term_blank_is_none() {
        let filter = BookFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), None);

        let filter = BookFilter {
            search: Some(" Orwell ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), Some("Orwell"));
    }

    #[test]
    fn test_book_serializes_author_as_id() {
        let book = Book {
            id: 3,
            title: "Clean Code".to_string(),
            publication_year: 2008,
            author_id: 2,
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["author"], 2);
        assert!(json.get("author_id").is_none());
    }
}
