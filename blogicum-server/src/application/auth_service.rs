use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{
    ProfileChanges, User, validate_email, validate_password, validate_username,
};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<User, DomainError> {
        validate_username(&registration.username)?;
        validate_email(&registration.email)?;
        validate_password(&registration.password)?;

        let hash = hash_password(&registration.password)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(
            registration.username,
            registration.email.to_lowercase(),
            registration.first_name,
            registration.last_name,
            hash,
        );
        self.repo.create(user).await
    }

    /// Returns a signed bearer token. Unknown users and wrong passwords are
    /// both `Unauthorized`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.keys
            .generate_token(user.id, &user.username)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        let mut user = self.get_user(user_id).await?;

        if let Some(username) = changes.username {
            validate_username(&username)?;
            user.username = username;
        }
        if let Some(email) = changes.email {
            validate_email(&email)?;
            user.email = email.to_lowercase();
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }

        let user = self.repo.update(user).await?;
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryStore::new()),
            JwtKeys::new("test-secret".into(), 60),
        )
    }

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.into(),
            email: format!("{username}@Example.org"),
            password: "long-enough".into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_token_for_user() {
        let auth = service();
        let user = auth.register(registration("anna")).await.unwrap();
        assert_eq!(user.email, "anna@example.org");

        let token = auth.login("anna", "long-enough").await.unwrap();
        let claims = auth.keys().verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_unauthorized() {
        let auth = service();
        auth.register(registration("anna")).await.unwrap();
        assert!(matches!(
            auth.login("anna", "not-the-password").await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(
            auth.login("boris", "long-enough").await,
            Err(DomainError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let auth = service();
        auth.register(registration("anna")).await.unwrap();
        assert!(matches!(
            auth.register(registration("anna")).await,
            Err(DomainError::UserAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let auth = service();
        let mut weak = registration("anna");
        weak.password = "short".into();
        assert!(matches!(
            auth.register(weak).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_cannot_take_another_username() {
        let auth = service();
        let anna = auth.register(registration("anna")).await.unwrap();
        auth.register(registration("boris")).await.unwrap();

        let taken = ProfileChanges {
            username: Some("boris".into()),
            ..Default::default()
        };
        assert!(matches!(
            auth.update_profile(anna.id, taken).await,
            Err(DomainError::UserAlreadyExists(_))
        ));

        let renamed = ProfileChanges {
            username: Some("anna_k".into()),
            first_name: Some("Anna".into()),
            ..Default::default()
        };
        let updated = auth.update_profile(anna.id, renamed).await.unwrap();
        assert_eq!(updated.username, "anna_k");
        assert_eq!(auth.get_user(anna.id).await.unwrap().first_name, "Anna");
    }
}
