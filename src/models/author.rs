//! Author model

use serde::{Deserialize, Serialize};

use super::Book;

/// An author owns zero or more books; deleting an author deletes its books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// Author with the nested list of books they wrote
#[derive(Debug, Clone, Serialize)]
pub struct AuthorWithBooks {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<Book>,
}

/// Input for creating an author
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuthorInput {
    pub name: String,
}
