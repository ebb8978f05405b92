use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::application::MutationOutcome;
use crate::data::Repositories;
use crate::domain::category::{Category, is_valid_slug};
use crate::domain::comment::CommentView;
use crate::domain::error::DomainError;
use crate::domain::page::{Page, PageRequest};
use crate::domain::policy::{Feed, Requester, can_mutate, can_read_now, effective_feed_filter};
use crate::domain::post::{CategoryRef, LocationRef, Post, PostChanges, PostDraft, PostView};
use crate::domain::user::Profile;

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct CategoryFeed {
    pub category: Category,
    pub posts: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileFeed {
    pub profile: Profile,
    pub posts: Page<PostView>,
}

#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
    page_size: u32,
}

impl PostService {
    pub fn new(repos: Repositories, page_size: u32) -> Self {
        Self { repos, page_size }
    }

    async fn feed(
        &self,
        feed: Feed,
        requester: &Requester,
        page: u32,
    ) -> Result<Page<PostView>, DomainError> {
        let request = PageRequest::new(page, self.page_size)?;
        let filter = effective_feed_filter(feed, requester);
        let (items, total) = self
            .repos
            .posts
            .list_feed(filter, Utc::now(), request)
            .await?;
        debug!(?feed, page, total, "feed page built");
        Page::new(items, request, total)
    }

    pub async fn home_feed(&self, page: u32) -> Result<Page<PostView>, DomainError> {
        self.feed(Feed::Home, &Requester::Anonymous, page).await
    }

    /// Unknown and unpublished categories are both `CategoryNotFound`.
    pub async fn category_feed(&self, slug: &str, page: u32) -> Result<CategoryFeed, DomainError> {
        if !is_valid_slug(slug) {
            return Err(DomainError::CategoryNotFound(slug.to_string()));
        }
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::CategoryNotFound(slug.to_string()))?;

        let posts = self
            .feed(Feed::Category(category.id), &Requester::Anonymous, page)
            .await?;
        Ok(CategoryFeed { category, posts })
    }

    pub async fn profile_feed(
        &self,
        username: &str,
        requester: &Requester,
        page: u32,
    ) -> Result<ProfileFeed, DomainError> {
        let owner = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;

        let posts = self.feed(Feed::Profile(owner.id), requester, page).await?;
        Ok(ProfileFeed {
            profile: Profile::from(owner),
            posts,
        })
    }

    /// A post the requester may not read is reported exactly like a missing
    /// one. Comments are listed without further checks.
    pub async fn post_detail(
        &self,
        id: Uuid,
        requester: &Requester,
    ) -> Result<PostDetail, DomainError> {
        let post = self
            .repos
            .posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))?;
        let category = match post.category_id {
            Some(category_id) => self.repos.categories.find_by_id(category_id).await?,
            None => None,
        };

        if !can_read_now(&post, category.as_ref(), requester) {
            debug!(post_id = %id, "post hidden from requester");
            return Err(DomainError::PostNotFound(id));
        }

        let location = match post.location_id {
            Some(location_id) => self.repos.locations.find_by_id(location_id).await?,
            None => None,
        };
        let author = self
            .repos
            .users
            .find_by_id(post.author_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        let comments = self.repos.comments.list_for_post(id).await?;

        let view = PostView {
            author,
            category: category.map(|c| CategoryRef {
                id: c.id,
                title: c.title,
                slug: c.slug,
            }),
            location: location.map(|l| LocationRef {
                id: l.id,
                name: l.name,
            }),
            comment_count: comments.len() as i64,
            post,
        };
        Ok(PostDetail {
            post: view,
            comments,
        })
    }

    async fn ensure_references_exist(
        &self,
        category_id: Option<Uuid>,
        location_id: Option<Uuid>,
    ) -> Result<(), DomainError> {
        if let Some(id) = category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                return Err(DomainError::Validation(format!("unknown category: {id}")));
            }
        }
        if let Some(id) = location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                return Err(DomainError::Validation(format!("unknown location: {id}")));
            }
        }
        Ok(())
    }

    #[instrument(skip(self, draft))]
    pub async fn create_post(&self, author_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        draft.validate()?;
        self.ensure_references_exist(draft.category_id, draft.location_id)
            .await?;
        let post = Post::new(author_id, draft);
        self.repos.posts.create(post).await
    }

    #[instrument(skip(self, changes))]
    pub async fn update_post(
        &self,
        requester: &Requester,
        post_id: Uuid,
        changes: PostChanges,
    ) -> Result<MutationOutcome<Post>, DomainError> {
        let mut post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;

        if !can_mutate(&post, requester) {
            info!(post_id = %post_id, "edit by non-author redirected");
            return Ok(MutationOutcome::RedirectToPost(post_id));
        }

        changes.validate()?;
        self.ensure_references_exist(
            changes.category_id.flatten(),
            changes.location_id.flatten(),
        )
        .await?;
        changes.apply(&mut post);

        self.repos
            .posts
            .update(post)
            .await?
            .map(MutationOutcome::Applied)
            .ok_or(DomainError::PostNotFound(post_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(
        &self,
        requester: &Requester,
        post_id: Uuid,
    ) -> Result<MutationOutcome<()>, DomainError> {
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;

        if !can_mutate(&post, requester) {
            info!(post_id = %post_id, "delete by non-author redirected");
            return Ok(MutationOutcome::RedirectToPost(post_id));
        }

        if !self.repos.posts.delete(post_id).await? {
            return Err(DomainError::PostNotFound(post_id));
        }
        Ok(MutationOutcome::Applied(()))
    }
}
