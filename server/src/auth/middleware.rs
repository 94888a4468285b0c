//! Request-scoped authentication layers.
//!
//! Layer order, outermost first:
//! 1. [`assign_request_id`] opens the per-request span and echoes `X-Request-Id`.
//! 2. `respond_with_api_error` renders every failure below it.
//! 3. [`authenticate`] turns the `Authorization` header into a [`RequestContext`].
//! 4. [`require_authenticated`] / [`require_admin`] guard route groups.
//!
//! # Post-conditions
//! - Every request leaving [`authenticate`] carries exactly one
//!   [`RequestContext`], built from that request's own header. Any context
//!   already present on the request is discarded first.
//!
//! # Invariants
//! - The context lives in the request's extensions, so it is dropped with the
//!   request on every exit path and is never visible to another request.
//! - Token failures never reject the request here; they only leave it
//!   anonymous. Routes that need a caller reject later with 401.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderName, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use super::jwt::{TokenClaims, TokenCodec, TokenError};
use super::policy;
use super::principal::{Principal, Role};
use crate::error::AppError;
use crate::time::TimeSource;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const BEARER_PREFIX: &str = "Bearer ";

/// Correlation id assigned by [`assign_request_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Per-request authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    /// `None` for anonymous requests.
    pub principal: Option<Principal>,
}

/// Why a request ended up anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousReason {
    NoAuthHeader,
    WrongScheme,
    EmptyToken,
    Rejected(TokenError),
    ClaimsIncomplete,
}

/// Terminal state of the header-to-principal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Anonymous(AnonymousReason),
    Authenticated(Principal),
}

/// Resolve an `Authorization` header value to a principal.
///
/// The scheme match is case-sensitive (`Bearer `); the token after it is
/// trimmed. A blank header counts as no header.
pub fn authenticate_header<C: TimeSource>(
    header: Option<&HeaderValue>,
    codec: &TokenCodec<C>,
) -> AuthOutcome {
    let Some(raw) = header.map(HeaderValue::as_bytes) else {
        return AuthOutcome::Anonymous(AnonymousReason::NoAuthHeader);
    };
    let Ok(value) = std::str::from_utf8(raw) else {
        return AuthOutcome::Anonymous(AnonymousReason::WrongScheme);
    };
    if value.trim().is_empty() {
        return AuthOutcome::Anonymous(AnonymousReason::NoAuthHeader);
    }
    let Some(token) = value.strip_prefix(BEARER_PREFIX) else {
        return AuthOutcome::Anonymous(AnonymousReason::WrongScheme);
    };
    let token = token.trim();
    if token.is_empty() {
        return AuthOutcome::Anonymous(AnonymousReason::EmptyToken);
    }

    match codec.verify(token) {
        Ok(claims) => principal_from_claims(&claims).map_or(
            AuthOutcome::Anonymous(AnonymousReason::ClaimsIncomplete),
            AuthOutcome::Authenticated,
        ),
        Err(error) => AuthOutcome::Anonymous(AnonymousReason::Rejected(error)),
    }
}

fn principal_from_claims(claims: &TokenClaims) -> Option<Principal> {
    let uid = claims.uid?;
    let role: Role = claims.role.as_deref()?.parse().ok()?;
    Some(Principal::new(uid, role))
}

/// Outermost layer: pick the request id and run the rest of the stack inside
/// the request span.
pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        user_id = tracing::field::Empty,
    );
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}

/// Attach a fresh [`RequestContext`] derived from the `Authorization` header.
pub async fn authenticate(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().remove::<RequestContext>();

    let outcome = authenticate_header(request.headers().get(header::AUTHORIZATION), &*codec);
    let principal = match outcome {
        AuthOutcome::Authenticated(principal) => {
            tracing::Span::current().record("user_id", principal.subject_id);
            tracing::debug!(
                "request authenticated (userId={}, role={})",
                principal.subject_id,
                principal.role
            );
            Some(principal)
        }
        AuthOutcome::Anonymous(reason) => {
            log_anonymous(reason);
            None
        }
    };

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    request.extensions_mut().insert(RequestContext {
        request_id,
        principal,
    });

    next.run(request).await
}

fn log_anonymous(reason: AnonymousReason) {
    match reason {
        AnonymousReason::NoAuthHeader => tracing::trace!("no credentials presented"),
        AnonymousReason::WrongScheme => {
            tracing::debug!("authorization header ignored: not a bearer credential");
        }
        AnonymousReason::EmptyToken => tracing::warn!("bearer token rejected: empty token"),
        AnonymousReason::Rejected(TokenError::Malformed) => {
            tracing::warn!("bearer token rejected: malformed");
        }
        AnonymousReason::Rejected(TokenError::SignatureInvalid) => {
            tracing::warn!("bearer token rejected: invalid signature");
        }
        AnonymousReason::Rejected(TokenError::Expired) => {
            tracing::warn!("bearer token rejected: expired");
        }
        AnonymousReason::ClaimsIncomplete => {
            tracing::warn!("bearer token rejected: uid or role claim missing or invalid");
        }
    }
}

fn principal_of(request: &Request) -> Option<Principal> {
    request
        .extensions()
        .get::<RequestContext>()
        .and_then(|ctx| ctx.principal)
}

/// Route layer: 401 unless the request carries a principal.
pub async fn require_authenticated(request: Request, next: Next) -> Result<Response, AppError> {
    if principal_of(&request).is_none() {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Route layer: 401 without a principal, 403 unless it is an admin.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let Some(principal) = principal_of(&request) else {
        return Err(AppError::Unauthorized);
    };
    policy::require_role(Some(&principal), Role::Admin)?;
    Ok(next.run(request).await)
}

/// Extractor for handlers that need the verified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.principal)
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}
