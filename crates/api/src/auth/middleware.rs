//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use partnerhub_shared::PartnerRole;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::jwt::{Claims, JwtManager};

/// Cookie set by the dashboard after login
pub const AUTH_COOKIE: &str = "partnerhub_auth_token";

/// Authenticated session, decoded once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    /// `x-hasura-user-id`; for partners this is the partner id
    pub user_id: Uuid,
    pub role: PartnerRole,
}

impl SessionContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let user_id = Uuid::parse_str(&claims.hasura.user_id).map_err(|_| AuthError::InvalidToken)?;

        if !claims
            .hasura
            .allowed_roles
            .iter()
            .any(|r| r == &claims.hasura.default_role)
        {
            return Err(AuthError::InvalidToken);
        }

        let role = PartnerRole::parse(&claims.hasura.default_role)
            .ok_or(AuthError::InsufficientPermissions)?;

        Ok(Self { user_id, role })
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == PartnerRole::Superadmin
    }
}

/// State needed for authentication
#[derive(Clone)]
pub struct AuthState {
    pub jwt_manager: JwtManager,
}

fn extract_token_from_cookie(request: &Request) -> Option<String> {
    let prefix = format!("{}=", AUTH_COOKIE);

    request
        .headers()
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
                .filter(|token| !token.is_empty())
                .map(String::from)
        })
}

/// Extract bearer token from Authorization header or cookie
/// Prefers Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    if let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    extract_token_from_cookie(request)
}

/// Middleware that requires authentication
pub async fn require_auth(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let Some(token) = extract_bearer_token(&request) else {
        tracing::debug!(path = %path, "require_auth: no token in header or cookie");
        return AuthError::MissingAuth.into_response();
    };

    let session = auth_state
        .jwt_manager
        .validate_token(&token)
        .and_then(|claims| SessionContext::from_claims(&claims));

    match session {
        Ok(session) => {
            tracing::debug!(
                path = %path,
                user_id = %session.user_id,
                role = session.role.as_str(),
                "require_auth: authenticated"
            );
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(path = %path, error = ?err, "require_auth: authentication failed");
            err.into_response()
        }
    }
}

/// Middleware that requires the superadmin role; must run after [`require_auth`]
pub async fn require_superadmin(request: Request, next: Next) -> Response {
    match request.extensions().get::<SessionContext>().copied() {
        Some(session) if session.is_superadmin() => next.run(request).await,
        Some(session) => {
            tracing::warn!(
                user_id = %session.user_id,
                role = session.role.as_str(),
                path = %request.uri().path(),
                "Unauthorized admin access attempt"
            );
            AuthError::InsufficientPermissions.into_response()
        }
        None => AuthError::MissingAuth.into_response(),
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    ExpiredToken,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidToken | AuthError::ExpiredToken => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token")
            }
            AuthError::InsufficientPermissions => {
                (StatusCode::FORBIDDEN, "Insufficient permissions")
            }
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
