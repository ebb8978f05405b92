use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::MutationOutcome;
use crate::data::Repositories;
use crate::domain::comment::{Comment, validate_comment_text};
use crate::domain::error::DomainError;
use crate::domain::policy::{Requester, can_mutate};

#[derive(Clone)]
pub struct CommentService {
    repos: Repositories,
}

impl CommentService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// The post only has to exist; whether the commenter could read it is
    /// not checked here.
    #[instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        if self.repos.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }
        validate_comment_text(&text)?;
        self.repos
            .comments
            .create(Comment::new(post_id, author_id, text))
            .await
    }

    async fn find_under_post(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or(DomainError::CommentNotFound(comment_id))
    }

    #[instrument(skip(self, text))]
    pub async fn update_comment(
        &self,
        requester: &Requester,
        post_id: Uuid,
        comment_id: Uuid,
        text: String,
    ) -> Result<MutationOutcome<Comment>, DomainError> {
        let comment = self.find_under_post(post_id, comment_id).await?;
        if !can_mutate(&comment, requester) {
            info!(comment_id = %comment_id, "comment edit by non-author redirected");
            return Ok(MutationOutcome::RedirectToPost(comment.post_id));
        }

        validate_comment_text(&text)?;
        self.repos
            .comments
            .update_text(comment_id, text)
            .await?
            .map(MutationOutcome::Applied)
            .ok_or(DomainError::CommentNotFound(comment_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        requester: &Requester,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<MutationOutcome<()>, DomainError> {
        let comment = self.find_under_post(post_id, comment_id).await?;
        if !can_mutate(&comment, requester) {
            info!(comment_id = %comment_id, "comment delete by non-author redirected");
            return Ok(MutationOutcome::RedirectToPost(comment.post_id));
        }

        if !self.repos.comments.delete(comment_id).await? {
            return Err(DomainError::CommentNotFound(comment_id));
        }
        Ok(MutationOutcome::Applied(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::domain::post::Post;
    use crate::domain::user::User;
    use chrono::Utc;
    use std::sync::Arc;

    async fn setup() -> (Repositories, CommentService, Post, User, User) {
        let repos = Repositories::in_memory(Arc::new(InMemoryStore::new()));
        let u1 = repos
            .users
            .create(User::new("u1".into(), "u1@x.org".into(), String::new(), String::new(), "h".into()))
            .await
            .unwrap();
        let u2 = repos
            .users
            .create(User::new("u2".into(), "u2@x.org".into(), String::new(), String::new(), "h".into()))
            .await
            .unwrap();
        let post = repos
            .posts
            .create(Post {
                id: Uuid::new_v4(),
                title: "P".into(),
                text: "body".into(),
                pub_date: Utc::now(),
                author_id: u1.id,
                location_id: None,
                category_id: None,
                image: None,
                is_published: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        (repos.clone(), CommentService::new(repos), post, u1, u2)
    }

    #[tokio::test]
    async fn stranger_cannot_delete_comment_and_is_sent_to_post() {
        let (repos, comments, post, u1, u2) = setup().await;
        let comment = comments.add_comment(u1.id, post.id, "mine".into()).await.unwrap();

        let outcome = comments
            .delete_comment(&Requester::User(u2.id), post.id, comment.id)
            .await
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::RedirectToPost(id) if id == post.id));
        assert!(repos.comments.find_by_id(comment.id).await.unwrap().is_some());

        let outcome = comments
            .delete_comment(&Requester::User(u1.id), post.id, comment.id)
            .await
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::Applied(())));
        assert!(repos.comments.find_by_id(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn only_author_edits_comment_text() {
        let (_, comments, post, u1, u2) = setup().await;
        let comment = comments.add_comment(u2.id, post.id, "typo".into()).await.unwrap();

        let outcome = comments
            .update_comment(&Requester::User(u1.id), post.id, comment.id, "post author".into())
            .await
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::RedirectToPost(_)));

        let outcome = comments
            .update_comment(&Requester::User(u2.id), post.id, comment.id, "fixed".into())
            .await
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::Applied(c) if c.text == "fixed"));
    }

    #[tokio::test]
    async fn comment_lookup_is_scoped_to_its_post() {
        let (_, comments, post, u1, _) = setup().await;
        let comment = comments.add_comment(u1.id, post.id, "here".into()).await.unwrap();
        assert!(matches!(
            comments
                .delete_comment(&Requester::User(u1.id), Uuid::new_v4(), comment.id)
                .await,
            Err(DomainError::CommentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn comment_on_missing_post_or_blank_text_fails() {
        let (_, comments, post, u1, _) = setup().await;
        assert!(matches!(
            comments.add_comment(u1.id, Uuid::new_v4(), "hello".into()).await,
            Err(DomainError::PostNotFound(_))
        ));
        assert!(matches!(
            comments.add_comment(u1.id, post.id, "   ".into()).await,
            Err(DomainError::Validation(_))
        ));
    }
}
