//! Post service
//!
//! Blog posts with tags. Only a post's author may edit or delete it.
//! Tags are get-or-created by name in the same transaction as the post.

use crate::db::repositories::{CommentRepository, PostRepository, TagRepository};
use crate::models::{CreatePostInput, Post, PostDetail, PostWithTags, UpdatePostInput, User};
use crate::services::tag::prepare_tags;
use anyhow::Context;
use std::sync::Arc;

/// Maximum post title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not the post's author
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {message}")]
    ValidationError { field: &'static str, message: String },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl PostServiceError {
    fn post_not_found(id: i64) -> Self {
        Self::NotFound(format!("Post {} not found", id))
    }
}

fn validate_title(title: &str) -> Result<String, PostServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PostServiceError::ValidationError {
            field: "title",
            message: "Title cannot be empty".to_string(),
        });
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(PostServiceError::ValidationError {
            field: "title",
            message: format!("Title cannot exceed {} characters", MAX_TITLE_LENGTH),
        });
    }
    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<(), PostServiceError> {
    if content.trim().is_empty() {
        return Err(PostServiceError::ValidationError {
            field: "content",
            message: "Content cannot be empty".to_string(),
        });
    }
    Ok(())
}

pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    tag_repo: Arc<dyn TagRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        tag_repo: Arc<dyn TagRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            post_repo,
            tag_repo,
            comment_repo,
        }
    }

    /// All posts, newest first
    pub async fn list(&self) -> Result<Vec<PostWithTags>, PostServiceError> {
        let posts = self.post_repo.list().await.context("Failed to list posts")?;
        self.with_tags(posts).await
    }

    /// Post with tags and comments
    pub async fn get_detail(&self, id: i64) -> Result<PostDetail, PostServiceError> {
        let post = self.get(id).await?;
        let tags = self
            .tag_repo
            .get_by_post_id(id)
            .await
            .context("Failed to get post tags")?;
        let comments = self
            .comment_repo
            .list_by_post(id)
            .await
            .context("Failed to get post comments")?;

        Ok(PostDetail {
            post,
            tags,
            comments,
        })
    }

    /// Create a post written by `author`
    pub async fn create(&self, author: &User, input: CreatePostInput) -> Result<PostWithTags, PostServiceError> {
        let title = validate_title(&input.title)?;
        validate_content(&input.content)?;

        let tags = prepare_tags(&input.tags.names());
        let (post, tags) = self
            .post_repo
            .create(&Post::new(title, input.content, author.id), &tags)
            .await
            .context("Failed to create post")?;

        tracing::info!("User {} created post {}", author.username, post.id);
        Ok(PostWithTags { post, tags })
    }

    /// Edit a post; `tags`, when given, replaces the tag set
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<PostWithTags, PostServiceError> {
        let mut post = self.get_owned(user, id).await?;

        if let Some(title) = input.title {
            post.title = validate_title(&title)?;
        }
        if let Some(content) = input.content {
            validate_content(&content)?;
            post.content = content;
        }
        let tags = input.tags.map(|list| prepare_tags(&list.names()));

        let post = self
            .post_repo
            .update(&post, tags.as_deref())
            .await
            .context("Failed to update post")?;
        let tags = self
            .tag_repo
            .get_by_post_id(post.id)
            .await
            .context("Failed to get post tags")?;

        Ok(PostWithTags { post, tags })
    }

    /// Delete a post and its comments
    pub async fn delete(&self, user: &User, id: i64) -> Result<(), PostServiceError> {
        self.get_owned(user, id).await?;
        self.post_repo.delete(id).await.context("Failed to delete post")?;
        tracing::info!("User {} deleted post {}", user.username, id);
        Ok(())
    }

    /// Posts carrying a tag, newest first
    pub async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<PostWithTags>, PostServiceError> {
        let posts = self
            .post_repo
            .list_by_tag(tag_id)
            .await
            .context("Failed to list posts by tag")?;
        self.with_tags(posts).await
    }

    /// Posts whose title, content or tag names contain `query`.
    ///
    /// A blank query matches nothing.
    pub async fn search(&self, query: &str) -> Result<Vec<PostWithTags>, PostServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let posts = self.post_repo.search(query).await.context("Failed to search posts")?;
        self.with_tags(posts).await
    }

    pub async fn get(&self, id: i64) -> Result<Post, PostServiceError> {
        self.post_repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::post_not_found(id))
    }

    async fn get_owned(&self, user: &User, id: i64) -> Result<Post, PostServiceError> {
        let post = self.get(id).await?;
        if !user.is_author_of(post.author_id) {
            return Err(PostServiceError::Forbidden(
                "Only the author can modify this post".to_string(),
            ));
        }
        Ok(post)
    }

    async fn with_tags(&self, posts: Vec<Post>) -> Result<Vec<PostWithTags>, PostServiceError> {
        let mut result = Vec::with_capacity(posts.len());
        for post in posts {
            let tags = self
                .tag_repo
                .get_by_post_id(post.id)
                .await
                .context("Failed to get post tags")?;
            result.push(PostWithTags { post, tags });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxPostRepository, SqlxTagRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{TagList, UserRole};

    struct Fixture {
        service: PostService,
        alice: User,
        bob: User,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let alice = users
            .create(&User::new("alice".into(), "alice@example.com".into(), "h".into(), UserRole::Member))
            .await
            .unwrap();
        let bob = users
            .create(&User::new("bob".into(), "bob@example.com".into(), "h".into(), UserRole::Admin))
            .await
            .unwrap();

        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool),
        );
        Fixture { service, alice, bob }
    }

    fn post_input(title: &str, tags: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            content: "Some content".to_string(),
            tags: TagList::Csv(tags.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_post_with_tags() {
        let f = setup().await;

        let created = f
            .service
            .create(&f.alice, post_input("Hello", "Rust, Web"))
            .await
            .unwrap();

        assert_eq!(created.post.author_id, f.alice.id);
        let slugs: Vec<&str> = created.tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["rust", "web"]);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title_and_content() {
        let f = setup().await;

        let result = f.service.create(&f.alice, post_input(" ", "")).await;
        assert!(matches!(
            result,
            Err(PostServiceError::ValidationError { field: "title", .. })
        ));

        let mut input = post_input("Title", "");
        input.content = "\n".to_string();
        let result = f.service.create(&f.alice, input).await;
        assert!(matches!(
            result,
            Err(PostServiceError::ValidationError { field: "content", .. })
        ));
    }

    #[tokio::test]
    async fn test_only_author_may_update_or_delete() {
        let f = setup().await;
        let created = f
            .service
            .create(&f.alice, post_input("Hello", "Rust"))
            .await
            .unwrap();
        let id = created.post.id;

        let update = UpdatePostInput {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(&f.bob, id, update).await,
            Err(PostServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete(&f.bob, id).await,
            Err(PostServiceError::Forbidden(_))
        ));

        let update = UpdatePostInput {
            tags: Some(TagList::Names(vec!["Axum".to_string()])),
            ..Default::default()
        };
        let updated = f.service.update(&f.alice, id, update).await.unwrap();
        assert_eq!(updated.post.title, "Hello");
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].name, "Axum");

        f.service.delete(&f.alice, id).await.unwrap();
        assert!(matches!(f.service.get(id).await, Err(PostServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_tag() {
        let f = setup().await;
        let tagged = f
            .service
            .create(&f.alice, post_input("Tagged", "Rust"))
            .await
            .unwrap();
        f.service
            .create(&f.alice, post_input("Untagged", ""))
            .await
            .unwrap();

        let posts = f.service.list_by_tag(tagged.tags[0].id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post.title, "Tagged");

        assert!(f.service.list_by_tag(9999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_blank_query_returns_nothing() {
        let f = setup().await;
        f.service
            .create(&f.alice, post_input("Hello", "Rust"))
            .await
            .unwrap();

        assert!(f.service.search("   ").await.unwrap().is_empty());
        assert_eq!(f.service.search("rust").await.unwrap().len(), 1);
        assert_eq!(f.service.search("HELLO").await.unwrap().len(), 1);
    }
}
