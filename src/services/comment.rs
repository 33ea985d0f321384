//! Comment service
//!
//! Comments on blog posts. Any authenticated user may comment; only a
//! comment's author may edit or delete it.

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, User};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {message}")]
    ValidationError { field: &'static str, message: String },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn validate_content(content: &str) -> Result<String, CommentServiceError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CommentServiceError::ValidationError {
            field: "content",
            message: "Comment cannot be empty".to_string(),
        });
    }
    Ok(content.to_string())
}

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comment_repo: Arc<dyn CommentRepository>, post_repo: Arc<dyn PostRepository>) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    /// Comments on a post, oldest first
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, CommentServiceError> {
        self.ensure_post_exists(post_id).await?;
        let comments = self
            .comment_repo
            .list_by_post(post_id)
            .await
            .context("Failed to list comments")?;
        Ok(comments)
    }

    pub async fn create(
        &self,
        author: &User,
        post_id: i64,
        content: &str,
    ) -> Result<Comment, CommentServiceError> {
        self.ensure_post_exists(post_id).await?;
        let content = validate_content(content)?;

        let comment = self
            .comment_repo
            .create(&Comment::new(post_id, author.id, content))
            .await
            .context("Failed to create comment")?;
        Ok(comment)
    }

    pub async fn update(&self, user: &User, id: i64, content: &str) -> Result<Comment, CommentServiceError> {
        self.get_owned(user, id).await?;
        let content = validate_content(content)?;

        let comment = self
            .comment_repo
            .update_content(id, &content)
            .await
            .context("Failed to update comment")?;
        Ok(comment)
    }

    pub async fn delete(&self, user: &User, id: i64) -> Result<(), CommentServiceError> {
        self.get_owned(user, id).await?;
        self.comment_repo
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    async fn get_owned(&self, user: &User, id: i64) -> Result<Comment, CommentServiceError> {
        let comment = self
            .comment_repo
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| CommentServiceError::NotFound(format!("Comment {} not found", id)))?;

        if !user.is_author_of(comment.author_id) {
            return Err(CommentServiceError::Forbidden(
                "Only the author can modify this comment".to_string(),
            ));
        }
        Ok(comment)
    }

    async fn ensure_post_exists(&self, post_id: i64) -> Result<(), CommentServiceError> {
        let post = self
            .post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?;
        if post.is_none() {
            return Err(CommentServiceError::NotFound(format!("Post {} not found", post_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxPostRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Post, UserRole};

    async fn setup() -> (CommentService, User, User, i64) {
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
            .create(&User::new("bob".into(), "bob@example.com".into(), "h".into(), UserRole::Member))
            .await
            .unwrap();

        let post_repo = SqlxPostRepository::boxed(pool.clone());
        let (post, _) = post_repo
            .create(&Post::new("Hello".into(), "World".into(), alice.id), &[])
            .await
            .unwrap();

        let service = CommentService::new(SqlxCommentRepository::boxed(pool), post_repo);
        (service, alice, bob, post.id)
    }

    #[tokio::test]
    async fn test_anyone_may_comment() {
        let (service, _alice, bob, post) = setup().await;

        let comment = service.create(&bob, post, " Nice! ").await.unwrap();
        assert_eq!(comment.content, "Nice!");
        assert_eq!(comment.author_id, bob.id);
        assert_eq!(service.list_for_post(post).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_author_may_edit_or_delete() {
        let (service, alice, bob, post) = setup().await;
        let comment = service.create(&bob, post, "Nice").await.unwrap();

        assert!(matches!(
            service.update(&alice, comment.id, "Edited").await,
            Err(CommentServiceError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(&alice, comment.id).await,
            Err(CommentServiceError::Forbidden(_))
        ));

        let edited = service.update(&bob, comment.id, "Edited").await.unwrap();
        assert_eq!(edited.content, "Edited");
        service.delete(&bob, comment.id).await.unwrap();
        assert!(service.list_for_post(post).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let (service, alice, _bob, post) = setup().await;
        assert!(matches!(
            service.create(&alice, 999, "Hi").await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.create(&alice, post, "  ").await,
            Err(CommentServiceError::ValidationError { .. })
        ));
    }
}
