use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, models::SessionInfo};

pub const SESSION_COOKIE: &str = "admin_token";
/// Seven days, in seconds. Used for both the token expiry and the cookie Max-Age.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Paths served by the admin SPA once logged in.
const ADMIN_PAGE_PREFIX: &str = "/admin/dashboard";
const ADMIN_API_PREFIX: &str = "/api/admin";
/// Where rejected page requests are sent (the login page).
const LOGIN_PAGE: &str = "/admin";
const GATE_EXEMPT: [&str; 2] = ["/api/admin/login", "/api/admin/logout"];

/// AuthError
///
/// Internal failures of the auth machinery (not rejected credentials, which are
/// plain 401s).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to sign session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Claims
///
/// Payload of the admin session token. `sub` is the admin id in database mode
/// and the configured email in static mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub admin_id: Option<Uuid>,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// AdminSession
///
/// The verified identity of a request, attached to the request extensions by
/// the gate. Handlers take it as an extractor instead of re-reading the cookie.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub subject: String,
    pub admin_id: Option<Uuid>,
    pub email: String,
    pub role: String,
}

impl From<Claims> for AdminSession {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            admin_id: claims.admin_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl From<AdminSession> for SessionInfo {
    fn from(session: AdminSession) -> Self {
        Self {
            admin_id: session.admin_id,
            email: session.email,
            role: session.role,
        }
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))
    }
}

/// The identity a token is issued for, produced by a `CredentialVerifier`.
#[derive(Debug, Clone)]
pub struct Identity {
    pub admin_id: Option<Uuid>,
    pub email: String,
    pub role: String,
}

/// TokenKeys
///
/// HS256 signing and verification keys derived from `JWT_SECRET`.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// sign
    ///
    /// Issues a token for `identity` expiring after `SESSION_TTL_SECS`.
    pub fn sign(&self, identity: &Identity) -> Result<String, AuthError> {
        self.sign_at(identity, Utc::now().timestamp())
    }

    /// Signs with an explicit issue time (negative offsets produce expired tokens in tests).
    pub fn sign_at(&self, identity: &Identity, issued_at: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: identity
                .admin_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| identity.email.clone()),
            admin_id: identity.admin_id,
            email: identity.email.clone(),
            role: identity.role.clone(),
            iat: issued_at,
            exp: issued_at + SESSION_TTL_SECS,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// verify
    ///
    /// Decodes and validates signature and expiry. Any failure is reported the
    /// same way; callers only ever answer "Invalid token".
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "rejected admin token");
                None
            }
        }
    }
}

// --- Cookies ---

/// The `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={SESSION_TTL_SECS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// An already-expired cookie that makes the browser drop the session.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Reads the session token from the `Cookie` header(s), ignoring empty values.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolves the session of a request or the 401 to answer with.
pub fn authenticate(headers: &HeaderMap, keys: &TokenKeys) -> Result<AdminSession, ApiError> {
    let token = session_token(headers).ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
    keys.verify(&token)
        .map(AdminSession::from)
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))
}

// --- Middleware ---

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether `path` is protected by the global admin gate.
pub fn is_gated(path: &str) -> bool {
    if GATE_EXEMPT.contains(&path) {
        return false;
    }
    under(path, ADMIN_PAGE_PREFIX) || under(path, ADMIN_API_PREFIX)
}

/// admin_gate
///
/// Global middleware guarding the admin pages and the admin API. Page requests
/// without a valid session are redirected to the login page; API requests get
/// a 401 JSON body. Everything else passes through untouched.
pub async fn admin_gate(State(keys): State<TokenKeys>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !is_gated(path) {
        return next.run(request).await;
    }
    let is_page = under(path, ADMIN_PAGE_PREFIX);

    match authenticate(request.headers(), &keys) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(rejection) if is_page => {
            tracing::debug!(error = %rejection, "redirecting unauthenticated page request");
            Redirect::to(LOGIN_PAGE).into_response()
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// require_admin
///
/// Route-level variant of the gate for the mutating methods of the public
/// content paths and the upload endpoint.
pub async fn require_admin(
    State(keys): State<TokenKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = authenticate(request.headers(), &keys)?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
