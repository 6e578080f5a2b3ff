//! Application configuration
//!
//! Central location for configuration constants, resource limits and
//! validation boundaries, plus the runtime settings read from the
//! environment at startup.

use crate::error::{AppError, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

// ===== Credential Validation =====

/// Minimum username length in UTF-16 code units
pub const MIN_USERNAME_LENGTH: usize = 3;
/// Maximum username length in UTF-16 code units
pub const MAX_USERNAME_LENGTH: usize = 24;

/// Minimum password length in UTF-16 code units
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length in UTF-16 code units
pub const MAX_PASSWORD_LENGTH: usize = 24;

// ===== Session =====

/// Name of the cookie carrying the sealed session payload
pub const SESSION_COOKIE_NAME: &str = "session";

/// Session lifetime in days
pub const SESSION_TTL_DAYS: i64 = 7;

/// Minimum length of the session secret in bytes
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

// ===== Routes =====

/// Route unauthenticated visitors are redirected to
pub const LOGIN_ROUTE: &str = "/login";

/// Public URL prefix under which uploaded attachments are served
pub const ATTACHMENT_URL_PREFIX: &str = "/user";

// ===== Attachments =====

/// Extensions classified as image attachments (compared lowercased)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Maximum accepted upload size (10 MiB)
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Maximum stored length of an attachment display name
pub const MAX_ATTACHMENT_NAME_LENGTH: usize = 255;

// ===== Runtime Defaults =====

const DEFAULT_DATABASE_PATH: &str = "data/tasktrack.db";
const DEFAULT_UPLOAD_DIR: &str = "public/user";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// Runtime settings for the HTTP server.
///
/// Loaded once in `main` through [`ServerConfig::from_env`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Secret the session sealing key is derived from
    pub session_secret: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Directory attachments are written to and served from
    pub upload_dir: PathBuf,
    /// Address the listener binds to
    pub bind_address: SocketAddr,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SESSION_SECRET`: key material for session sealing (required, >= 32 bytes)
    /// - `DATABASE_PATH`: SQLite file (optional, default: `data/tasktrack.db`)
    /// - `UPLOAD_DIR`: attachment directory (optional, default: `public/user`)
    /// - `BIND_ADDRESS`: listener address (optional, default: `127.0.0.1:3000`)
    /// - `COOKIE_SECURE`: `true`/`false` (optional, default: `true`)
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when the secret is missing or too short,
    /// or when a value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| AppError::Config("Missing environment variable: SESSION_SECRET".into()))?;

        let bind_address = env_or("BIND_ADDRESS", DEFAULT_BIND_ADDRESS)
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("Invalid value for BIND_ADDRESS: {}", e)))?;

        let cookie_secure = parse_bool("COOKIE_SECURE", &env_or("COOKIE_SECURE", "true"))?;

        let config = Self {
            session_secret,
            database_path: PathBuf::from(env_or("DATABASE_PATH", DEFAULT_DATABASE_PATH)),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", DEFAULT_UPLOAD_DIR)),
            bind_address,
            cookie_secure,
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints not expressible while parsing.
    pub fn validate(&self) -> Result<()> {
        if self.session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(AppError::Config(format!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_SESSION_SECRET_LENGTH
            )));
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(AppError::Config(format!(
            "Invalid value for {}: expected a boolean, got {:?}",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config_with_secret(secret: &str) -> ServerConfig {
        ServerConfig {
            session_secret: secret.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            bind_address: DEFAULT_BIND_ADDRESS.parse().unwrap(),
            cookie_secure: true,
        }
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("1", true)]
    #[case("no", false)]
    #[case(" false ", false)]
    fn test_parse_bool_accepts_common_spellings(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_bool("COOKIE_SECURE", raw).unwrap(), expected);
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        assert!(matches!(
            parse_bool("COOKIE_SECURE", "maybe"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(config_with_secret("short").validate().is_err());
        assert!(config_with_secret(&"k".repeat(MIN_SESSION_SECRET_LENGTH))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_image_extensions_are_lowercase() {
        assert!(IMAGE_EXTENSIONS
            .iter()
            .all(|ext| ext.chars().all(|c| c.is_ascii_lowercase())));
    }
}
