//! Server configuration module.
//!
//! Configuration is read once from environment variables at startup.
//!
//! # Environment Variables
//!
//! - `TASKBOARD_JWT_SECRET`: HS256 signing secret (required, at least 32 bytes)
//! - `TASKBOARD_ACCESS_TOKEN_MINUTES`: access token lifetime (default: `15`)
//! - `TASKBOARD_LISTEN_PORT`: port to listen on (default: `8080`)
//! - `TASKBOARD_ADMIN_EMAIL` / `TASKBOARD_ADMIN_PASSWORD`: optional admin
//!   account created at startup; both or neither must be set
//!
//! # Invariants
//!
//! - `jwt_secret` is never empty; its length is checked again when the token
//!   codec is built.
//! - `access_token_ttl` may be zero or negative.

use std::fmt;

use chrono::TimeDelta;

pub const JWT_SECRET_VAR: &str = "TASKBOARD_JWT_SECRET";
pub const ACCESS_TOKEN_MINUTES_VAR: &str = "TASKBOARD_ACCESS_TOKEN_MINUTES";
pub const LISTEN_PORT_VAR: &str = "TASKBOARD_LISTEN_PORT";
pub const ADMIN_EMAIL_VAR: &str = "TASKBOARD_ADMIN_EMAIL";
pub const ADMIN_PASSWORD_VAR: &str = "TASKBOARD_ADMIN_PASSWORD";

/// Credentials of the admin account bootstrapped at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Server configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Shared secret for signing and verifying access tokens.
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: TimeDelta,
    pub listen_port: u16,
    pub admin: Option<AdminBootstrap>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("listen_port", &self.listen_port)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 15;

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `TASKBOARD_JWT_SECRET` is not set or is empty
    /// - a numeric variable is set but does not parse
    /// - only one of the admin bootstrap variables is set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = Self::load_jwt_secret(&lookup)?;
        let access_token_ttl = Self::load_access_token_ttl(&lookup)?;
        let listen_port = Self::load_listen_port(&lookup)?;
        let admin = Self::load_admin(&lookup)?;

        Ok(Self {
            jwt_secret,
            access_token_ttl,
            listen_port,
            admin,
        })
    }

    fn load_jwt_secret(lookup: &impl Fn(&str) -> Option<String>) -> Result<Vec<u8>, ConfigError> {
        let secret =
            lookup(JWT_SECRET_VAR).ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET_VAR.to_string()))?;
        if secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: JWT_SECRET_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(secret.into_bytes())
    }

    fn load_access_token_ttl(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<TimeDelta, ConfigError> {
        let Some(value) = lookup(ACCESS_TOKEN_MINUTES_VAR) else {
            return Ok(TimeDelta::minutes(Self::DEFAULT_ACCESS_TOKEN_MINUTES));
        };
        value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(TimeDelta::try_minutes)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: ACCESS_TOKEN_MINUTES_VAR.to_string(),
                message: format!("'{value}' is not a valid number of minutes"),
            })
    }

    fn load_listen_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
        match lookup(LISTEN_PORT_VAR) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: LISTEN_PORT_VAR.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            None => Ok(Self::DEFAULT_PORT),
        }
    }

    fn load_admin(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Option<AdminBootstrap>, ConfigError> {
        let email = lookup(ADMIN_EMAIL_VAR).filter(|v| !v.trim().is_empty());
        let password = lookup(ADMIN_PASSWORD_VAR).filter(|v| !v.is_empty());
        match (email, password) {
            (Some(email), Some(password)) => Ok(Some(AdminBootstrap { email, password })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(ADMIN_PASSWORD_VAR.to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(ADMIN_EMAIL_VAR.to_string())),
        }
    }
}
