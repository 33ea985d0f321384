//! Library model

use serde::{Deserialize, Serialize};

use super::Book;

/// A library holding a set of books from the shared catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub id: i64,
    pub name: String,
}

/// The single librarian assigned to a library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Librarian {
    pub id: i64,
    pub name: String,
    #[serde(rename = "library")]
    pub library_id: i64,
}

/// Library with its books and (optional) librarian
#[derive(Debug, Clone, Serialize)]
pub struct LibraryDetail {
    #[serde(flatten)]
    pub library: Library,
    pub books: Vec<Book>,
    pub librarian: Option<Librarian>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLibraryInput {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddLibraryBookInput {
    pub book_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignLibrarianInput {
    pub name: String,
}
