//! Authentication and authorization.
//!
//! Tokens are issued at registration and login ([`service`]), verified on every
//! request ([`middleware`]) and turned into a [`Principal`] that handlers check
//! with the guards in [`policy`].
//!
//! # Pre-conditions
//! - The signing secret is loaded once at startup and is at least
//!   [`MIN_SECRET_BYTES`] long.
//!
//! # Post-conditions
//! - The codec and its secret are immutable once built.
//!
//! # Invariants
//! - A principal's id and role come only from a verified, unexpired token.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod principal;
pub mod service;

pub use jwt::{IssueError, MIN_SECRET_BYTES, TokenClaims, TokenCodec, TokenError, WeakSecretKey};
pub use middleware::{
    AnonymousReason, AuthOutcome, Authenticated, RequestContext, RequestId, authenticate_header,
};
pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use policy::{AccessError, DenialReason};
pub use principal::{Principal, Role, UnknownRole};
pub use service::{AuthResponse, AuthService, LoginRequest, RegisterRequest};
