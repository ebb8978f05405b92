pub mod category_repository;
pub mod comment_repository;
pub mod location_repository;
pub mod memory;
pub mod post_repository;
pub mod user_repository;

use std::sync::Arc;

use sqlx::PgPool;

use category_repository::{CategoryRepository, PostgresCategoryRepository};
use comment_repository::{CommentRepository, PostgresCommentRepository};
use location_repository::{LocationRepository, PostgresLocationRepository};
use memory::InMemoryStore;
use post_repository::{PostRepository, PostgresPostRepository};
use user_repository::{PostgresUserRepository, UserRepository};

/// Every repository the services depend on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(pool.clone())),
            locations: Arc::new(PostgresLocationRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            categories: store.clone(),
            locations: store,
        }
    }
}
