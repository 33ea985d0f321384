//! Services layer - Business logic
//!
//! Services implement validation and ownership rules on top of the
//! repositories. Each service has its own `thiserror` error enum; the API
//! layer maps those onto HTTP responses.

pub mod author;
pub mod book;
pub mod comment;
pub mod library;
pub mod password;
pub mod post;
pub mod tag;
pub mod user;

pub use author::{AuthorService, AuthorServiceError};
pub use book::{validate_publication_year, BookService, BookServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use library::{LibraryService, LibraryServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use tag::{generate_tag_slug, TagService, TagServiceError};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
