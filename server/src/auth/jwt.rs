//! Access token issuance and verification.
//!
//! Tokens are HS256-signed JWTs carrying `{sub, uid, role, iat, exp}`. They are
//! self-contained: the server keeps no per-token state and a token stays valid
//! until its `exp` passes.
//!
//! # Pre-conditions
//! - The shared secret is at least [`MIN_SECRET_BYTES`] long.
//!
//! # Post-conditions
//! - `verify` returns claims only for tokens that parse, carry a valid
//!   signature under the configured secret, and have `exp > now`.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.
//! - Checks run in a fixed order: structure, then signature, then expiry.

use std::fmt;

use chrono::TimeDelta;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::time::{SystemTimeSource, TimeSource};

/// Minimum HS256 secret length in bytes (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

/// Claims embedded in an access token.
///
/// `uid` and `role` are optional at the type level so that a token signed
/// without them, or with them in the wrong JSON type, still decodes; the
/// authentication layer decides whether the claim set is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject label (the user's email).
    pub sub: String,
    /// Numeric user id.
    #[serde(
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub uid: Option<i64>,
    /// Role name, e.g. `"USER"` or `"ADMIN"`.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    /// Issued-at, seconds since Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since Unix epoch.
    pub exp: i64,
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(Value::as_i64))
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Error returned when token verification fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token could not be parsed as a signed JWT with the expected shape.
    #[error("malformed token")]
    Malformed,
    /// The signature does not match the payload under the configured secret.
    #[error("invalid token signature")]
    SignatureInvalid,
    /// The token's `exp` is not in the future.
    #[error("token has expired")]
    Expired,
}

/// Error returned when a token cannot be issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueError {
    /// The role claim would be empty.
    #[error("role must not be empty")]
    EmptyRole,
    /// The signing backend rejected the input.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Startup-time error: the configured secret is too short to sign with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("JWT secret is too weak: {actual} bytes, at least {required} required")]
pub struct WeakSecretKey {
    pub actual: usize,
    pub required: usize,
}

/// Issues and verifies HS256 access tokens with a single process-wide secret.
///
/// The codec is immutable after construction and safe to share across
/// request tasks without synchronization.
pub struct TokenCodec<C: TimeSource = SystemTimeSource> {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: TimeDelta,
    clock: C,
}

impl TokenCodec {
    /// Create a codec that reads the system clock.
    ///
    /// # Errors
    /// Returns `WeakSecretKey` if `secret` is shorter than [`MIN_SECRET_BYTES`].
    pub fn new(secret: &[u8], access_token_ttl: TimeDelta) -> Result<Self, WeakSecretKey> {
        Self::with_clock(secret, access_token_ttl, SystemTimeSource)
    }
}

impl<C: TimeSource> TokenCodec<C> {
    /// Create a codec with an explicit clock.
    ///
    /// # Errors
    /// Returns `WeakSecretKey` if `secret` is shorter than [`MIN_SECRET_BYTES`].
    pub fn with_clock(
        secret: &[u8],
        access_token_ttl: TimeDelta,
        clock: C,
    ) -> Result<Self, WeakSecretKey> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(WeakSecretKey {
                actual: secret.len(),
                required: MIN_SECRET_BYTES,
            });
        }

        // Expiry is checked against our own clock after the signature, with
        // no leeway, so the library's time-based checks are switched off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        tracing::info!(
            "token codec initialized (accessTokenTtlMinutes={})",
            access_token_ttl.num_minutes()
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_token_ttl,
            clock,
        })
    }

    /// The configured access token lifetime.
    #[must_use]
    pub const fn access_token_ttl(&self) -> TimeDelta {
        self.access_token_ttl
    }

    /// Issue a token with the configured access token lifetime.
    ///
    /// # Errors
    /// See [`TokenCodec::issue`].
    pub fn issue_access_token(
        &self,
        subject_id: i64,
        subject_label: &str,
        role: &str,
    ) -> Result<String, IssueError> {
        self.issue(subject_id, subject_label, role, self.access_token_ttl)
    }

    /// Issue a signed token with `iat = now` and `exp = now + ttl`.
    ///
    /// A zero or negative `ttl` is accepted and yields a token that is
    /// already expired.
    ///
    /// # Errors
    /// Returns `IssueError::EmptyRole` if `role` is empty, or
    /// `IssueError::Signing` if the signing backend fails.
    pub fn issue(
        &self,
        subject_id: i64,
        subject_label: &str,
        role: &str,
        ttl: TimeDelta,
    ) -> Result<String, IssueError> {
        if role.is_empty() {
            return Err(IssueError::EmptyRole);
        }

        let iat = self.clock.now_secs();
        let exp = iat.saturating_add(ttl.num_seconds());
        let claims = TokenClaims {
            sub: subject_label.to_string(),
            uid: Some(subject_id),
            role: Some(role.to_string()),
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| IssueError::Signing(e.to_string()))?;

        tracing::debug!(
            "access token issued (uid={}, sub={}, role={}, exp={})",
            subject_id,
            subject_label,
            role,
            exp
        );
        Ok(token)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// - `TokenError::Malformed` if the token does not parse.
    /// - `TokenError::SignatureInvalid` if the signature does not match.
    /// - `TokenError::Expired` if `exp <= now`.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        tracing::trace!("token verification attempt");

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| map_jwt_error(token, &e))?;
        let claims = token_data.claims;

        if claims.exp <= self.clock.now_secs() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl<C: TimeSource> fmt::Debug for TokenCodec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_token_ttl", &self.access_token_ttl)
            .finish_non_exhaustive()
    }
}

/// Maps jsonwebtoken errors to our `TokenError` type.
///
/// The library verifies the signature before it decodes the claims, so once
/// the header has decoded, a base64 failure can only come from the signature
/// segment. That happens when a flipped final character leaves non-zero
/// trailing bits, and it is reported as an invalid signature.
fn map_jwt_error(token: &str, error: &jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::Base64(_) if token.split('.').count() == 3 && decode_header(token).is_ok() => {
            TokenError::SignatureInvalid
        }
        _ => TokenError::Malformed,
    }
}
