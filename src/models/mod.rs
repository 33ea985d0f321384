//! Data models
//!
//! Database entities and the request/response types built around them:
//! - catalogue: Author, Book
//! - libraries: Library, Librarian
//! - accounts: User, Session
//! - blog: Post, Comment, Tag

mod author;
mod book;
mod comment;
mod library;
mod post;
mod session;
mod tag;
mod user;

pub use author::{Author, AuthorWithBooks, CreateAuthorInput};
pub use book::{Book, BookFilter, BookOrdering, CreateBookInput, UpdateBookInput};
pub use comment::{Comment, CommentInput};
pub use library::{
    AddLibraryBookInput, AssignLibrarianInput, CreateLibraryInput, Librarian, Library,
    LibraryDetail,
};
pub use post::{CreatePostInput, Post, PostDetail, PostWithTags, TagList, UpdatePostInput};
pub use session::Session;
pub use tag::{Tag, TagWithCount};
pub use user::{UpdateProfileInput, User, UserRole};
