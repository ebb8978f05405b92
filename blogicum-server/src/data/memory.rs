//! Process-local store implementing every repository trait, used by the
//! test suites. Mirrors the uniqueness and cascade rules of the PostgreSQL
//! schema.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data::category_repository::CategoryRepository;
use crate::data::comment_repository::CommentRepository;
use crate::data::location_repository::LocationRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::category::Category;
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::page::PageRequest;
use crate::domain::policy::FeedFilter;
use crate::domain::post::{CategoryRef, LocationRef, Post, PostView};
use crate::domain::user::User;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl State {
    fn username(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn view(&self, post: &Post) -> PostView {
        let category = post
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(|c| CategoryRef {
                id: c.id,
                title: c.title.clone(),
                slug: c.slug.clone(),
            });
        let location = post
            .location_id
            .and_then(|id| self.locations.get(&id))
            .map(|l| LocationRef {
                id: l.id,
                name: l.name.clone(),
            });
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as i64;
        PostView {
            post: post.clone(),
            author: self.username(post.author_id),
            category,
            location,
            comment_count,
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the maps consistent: every
    // mutation is a single insert or remove.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.write();
        if state.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.write();
        if state
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                stored.username = user.username;
                stored.email = user.email;
                stored.first_name = user.first_name;
                stored.last_name = user.last_name;
                Ok(stored.clone())
            }
            None => Err(DomainError::UserNotFound(user.username)),
        }
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: Category) -> Result<Category, DomainError> {
        let mut state = self.write();
        if state.categories.values().any(|c| c.slug == category.slug) {
            return Err(DomainError::Validation(format!(
                "slug already taken: {}",
                category.slug
            )));
        }
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        Ok(self.read().categories.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        Ok(self
            .read()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn list_published(&self) -> Result<Vec<Category>, DomainError> {
        let mut categories: Vec<Category> = self
            .read()
            .categories
            .values()
            .filter(|c| c.is_published)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.description.cmp(&b.description).then(a.id.cmp(&b.id)));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn create(&self, location: Location) -> Result<Location, DomainError> {
        self.write().locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, DomainError> {
        Ok(self.read().locations.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Location>, DomainError> {
        let mut locations: Vec<Location> = self.read().locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(locations)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        self.write().posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        Ok(self.read().posts.get(&id).cloned())
    }

    async fn update(&self, post: Post) -> Result<Option<Post>, DomainError> {
        let mut state = self.write();
        match state.posts.get_mut(&post.id) {
            Some(stored) => {
                *stored = post;
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.write();
        let removed = state.posts.remove(&id).is_some();
        if removed {
            state.comments.retain(|_, c| c.post_id != id);
        }
        Ok(removed)
    }

    async fn list_feed(
        &self,
        filter: FeedFilter,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<(Vec<PostView>, i64), DomainError> {
        let state = self.read();
        let mut matching: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| {
                let category = p.category_id.and_then(|id| state.categories.get(&id));
                filter.matches(p, category, now)
            })
            .collect();
        matching.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then(b.created_at.cmp(&a.created_at))
                .then(a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|p| state.view(p))
            .collect();
        Ok((items, total))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        let mut state = self.write();
        if !state.posts.contains_key(&comment.post_id) {
            return Err(DomainError::PostNotFound(comment.post_id));
        }
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, DomainError> {
        Ok(self.read().comments.get(&id).cloned())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let state = self.read();
        let mut comments: Vec<&Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments
            .into_iter()
            .map(|c| CommentView {
                comment: c.clone(),
                author: state.username(c.author_id),
            })
            .collect())
    }

    async fn update_text(&self, id: Uuid, text: String) -> Result<Option<Comment>, DomainError> {
        let mut state = self.write();
        Ok(state.comments.get_mut(&id).map(|c| {
            c.text = text;
            c.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.write().comments.remove(&id).is_some())
    }
}
