//! Registration and login: the two places access tokens are issued.
//!
//! # Post-conditions
//! - Stored emails are trimmed and lowercased; lookups use the same form.
//! - Login failures never reveal whether the email exists.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::jwt::TokenCodec;
use super::password::PasswordHasher;
use super::principal::Role;
use crate::error::AppError;
use crate::store::{StoreError, UserStore};
use crate::users::{NewUser, User};

pub const EMAIL_MAX_CHARS: usize = 320;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 72;

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        if let Err(problem) = check_email(&self.email) {
            problems.push(problem);
        }
        if self.email.trim().chars().count() > EMAIL_MAX_CHARS {
            problems.push(format!("email: size must be at most {EMAIL_MAX_CHARS}"));
        }
        let password_chars = self.password.chars().count();
        if self.password.trim().is_empty() {
            problems.push("password: must not be blank".to_string());
        } else if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&password_chars) {
            problems.push(format!(
                "password: size must be between {PASSWORD_MIN_CHARS} and {PASSWORD_MAX_CHARS}"
            ));
        }
        validation_result(problems)
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        if let Err(problem) = check_email(&self.email) {
            problems.push(problem);
        }
        if self.password.trim().is_empty() {
            problems.push("password: must not be blank".to_string());
        }
        validation_result(problems)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            users,
            hasher,
            codec,
        }
    }

    /// Create a USER account and return a token for it.
    pub fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
        request.validate()?;
        let email = normalize_email(&request.email);
        tracing::info!("register attempt (email={email})");

        let user = self.create_user(email, &request.password, Role::User)?;
        tracing::info!(
            "register success (userId={}, email={}, role={})",
            user.id,
            user.email,
            user.role
        );
        self.token_for(&user)
    }

    /// Check credentials and return a fresh token.
    pub fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AppError> {
        request.validate()?;
        let email = normalize_email(&request.email);
        tracing::info!("login attempt (email={email})");

        let Some(user) = self.users.find_by_email(&email)? else {
            tracing::warn!("login failed: user not found (email={email})");
            return Err(AppError::BadCredentials);
        };
        if !self.hasher.matches(&request.password, &user.password_hash) {
            tracing::warn!("login failed: bad credentials (userId={}, email={})", user.id, email);
            return Err(AppError::BadCredentials);
        }

        tracing::info!(
            "login success (userId={}, email={}, role={})",
            user.id,
            user.email,
            user.role
        );
        self.token_for(&user)
    }

    /// Create an ADMIN account unless the email is already registered.
    ///
    /// Returns whether an account was created.
    pub fn ensure_admin(&self, email: &str, password: &str) -> Result<bool, AppError> {
        let email = normalize_email(email);
        if self.users.exists_by_email(&email)? {
            tracing::debug!("admin bootstrap skipped: account exists (email={email})");
            return Ok(false);
        }
        let user = self.create_user(email, password, Role::Admin)?;
        tracing::info!("admin bootstrapped (userId={}, email={})", user.id, user.email);
        Ok(true)
    }

    fn create_user(&self, email: String, password: &str, role: Role) -> Result<User, AppError> {
        if self.users.exists_by_email(&email)? {
            tracing::warn!("register rejected: email already exists (email={email})");
            return Err(email_taken(email));
        }
        let password_hash = self.hasher.hash(password)?;
        self.users
            .insert(NewUser {
                email,
                password_hash,
                role,
            })
            .map_err(|e| match e {
                StoreError::DuplicateEmail(email) => email_taken(email),
                other => other.into(),
            })
    }

    fn token_for(&self, user: &User) -> Result<AuthResponse, AppError> {
        let access_token = self
            .codec
            .issue_access_token(user.id, &user.email, user.role.as_str())?;
        Ok(AuthResponse { access_token })
    }
}

/// Trim and lowercase an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("email: must not be blank".to_string());
    }
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        })
        && !email.chars().any(char::is_whitespace);
    if well_formed {
        Ok(())
    } else {
        Err("email: must be a well-formed email address".to_string())
    }
}

fn email_taken(email: String) -> AppError {
    AppError::Conflict(format!("Email already exists: {email}"))
}

fn validation_result(problems: Vec<String>) -> Result<(), AppError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(problems.join("; ")))
    }
}
