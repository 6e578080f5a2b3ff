//! Authentication service
//!
//! Registration and login. Both validate credential shape first, then
//! hash or verify the password and issue a session token on success.

use crate::config::{
    MAX_PASSWORD_LENGTH, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH,
};
use crate::crypto;
use crate::database::{Credentials, Repository};
use crate::error::{AppError, Result};
use crate::session::SessionManager;

/// A session issued for a user
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user_id: i64,
    pub token: String,
}

/// Service for registering and logging in users
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(repo: Repository, sessions: SessionManager) -> Self {
        Self { repo, sessions }
    }

    /// Create an account and log it in
    pub async fn register(&self, credentials: Credentials) -> Result<IssuedSession> {
        validate_credentials(&credentials)?;
        let Credentials { username, password } = credentials;

        tracing::info!("Registering user: {}", username);

        let hashed = tokio::task::spawn_blocking(move || crypto::hash_password(&password))
            .await
            .map_err(|e| AppError::Crypto(format!("Hashing task failed: {}", e)))??;

        let user = self.repo.create_user(&username, &hashed).await?;
        let token = self.sessions.issue(user.id)?;

        tracing::info!("User registered: {}", user.id);

        Ok(IssuedSession {
            user_id: user.id,
            token,
        })
    }

    /// Check credentials and issue a session
    pub async fn login(&self, credentials: Credentials) -> Result<IssuedSession> {
        validate_credentials(&credentials)?;
        let Credentials { username, password } = credentials;

        let user = self
            .repo
            .find_user_by_username(&username)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let stored = user.password.clone();
        let matches =
            tokio::task::spawn_blocking(move || crypto::verify_password(&password, &stored))
                .await
                .map_err(|e| AppError::Crypto(format!("Verification task failed: {}", e)))??;

        if !matches {
            tracing::info!("Rejected login for user: {}", user.id);
            return Err(AppError::WrongPassword);
        }

        let token = self.sessions.issue(user.id)?;

        tracing::info!("User logged in: {}", user.id);

        Ok(IssuedSession {
            user_id: user.id,
            token,
        })
    }
}

/// Username 3-24, password 8-24, counted in UTF-16 code units
pub fn validate_credentials(credentials: &Credentials) -> Result<()> {
    check_length(
        "username",
        &credentials.username,
        MIN_USERNAME_LENGTH,
        MAX_USERNAME_LENGTH,
    )?;
    check_length(
        "password",
        &credentials.password,
        MIN_PASSWORD_LENGTH,
        MAX_PASSWORD_LENGTH,
    )
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.encode_utf16().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {} characters long, got {}",
            field, min, max, len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;
    use rstest::rstest;

    async fn create_test_service() -> AuthService {
        let repo = Repository::new(create_memory_pool().await.unwrap());
        let sessions = SessionManager::new("auth-service-test-secret-0123456789", true).unwrap();
        AuthService::new(repo, sessions)
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[rstest]
    #[case("ab", "password1", false)]
    #[case("abc", "password1", true)]
    #[case(&"u".repeat(24), "password1", true)]
    #[case(&"u".repeat(25), "password1", false)]
    #[case("alice", "short", false)]
    #[case("alice", "12345678", true)]
    #[case("alice", &"p".repeat(25), false)]
    #[case("äöü", "pässwörd", true)]
    #[case("alice", &"🔑".repeat(4), true)]
    #[case("alice", &"🔑".repeat(13), false)]
    #[case("🐱", "password1", false)]
    fn test_validate_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] valid: bool,
    ) {
        assert_eq!(validate_credentials(&creds(username, password)).is_ok(), valid);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = create_test_service().await;

        let registered = service.register(creds("alice", "password1")).await.unwrap();
        let logged_in = service.login(creds("alice", "password1")).await.unwrap();

        assert_eq!(registered.user_id, logged_in.user_id);
        assert_eq!(
            service.sessions.verify(&logged_in.token).unwrap().id,
            registered.user_id
        );
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_plain() {
        let service = create_test_service().await;
        service.register(creds("alice", "password1")).await.unwrap();

        let user = service
            .repo
            .find_user_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(user.password, "password1");
    }

    #[tokio::test]
    async fn test_login_errors() {
        let service = create_test_service().await;
        service.register(creds("alice", "password1")).await.unwrap();

        assert!(matches!(
            service.login(creds("alice", "password2")).await,
            Err(AppError::WrongPassword)
        ));
        assert!(matches!(
            service.login(creds("nobody", "password1")).await,
            Err(AppError::UserNotFound)
        ));
        assert!(matches!(
            service.login(creds("a", "password1")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let service = create_test_service().await;
        service.register(creds("alice", "password1")).await.unwrap();

        assert!(matches!(
            service.register(creds("alice", "password2")).await,
            Err(AppError::UsernameTaken(_))
        ));
    }
}
