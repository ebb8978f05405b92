use crate::domain::error::DomainError;
use crate::domain::location::Location;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, location: Location) -> Result<Location, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, DomainError>;
    /// All locations ordered by name.
    async fn list(&self) -> Result<Vec<Location>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresLocationRepository {
    pool: PgPool,
}

impl PostgresLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn create(&self, location: Location) -> Result<Location, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, is_published, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(location.is_published)
        .bind(location.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create location: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(location_id = %location.id, "location created");
        Ok(location)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, DomainError> {
        sqlx::query_as::<_, Location>(
            "SELECT id, name, is_published, created_at FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find location {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn list(&self) -> Result<Vec<Location>, DomainError> {
        sqlx::query_as::<_, Location>(
            "SELECT id, name, is_published, created_at FROM locations ORDER BY name ASC, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while listing locations: {}", e);
            DomainError::Internal(e.to_string())
        })
    }
}
