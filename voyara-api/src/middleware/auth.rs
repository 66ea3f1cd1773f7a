use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use voyara_core::session::{Role, Session};

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Numeric user id, as a string subject.
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Resolve a bearer token into a caller session. Fails closed: a bad
/// signature, an expired token, or a non-numeric subject all resolve to no
/// session. An unrecognised role resolves to a session without a role.
pub fn resolve_session(token: &str, secret: &str) -> Option<Session> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    let user_id: i64 = token_data.claims.sub.parse().ok()?;
    Some(Session { user_id, role: Role::parse(&token_data.claims.role) })
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

// ============================================================================
// Session Middleware
// ============================================================================

pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Resolve the session, failing closed
    let session = resolve_session(token, &state.auth.secret).ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Inject the resolved session into request extensions
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Middleware
// ============================================================================

pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract and resolve, same as any session
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;
    let session = resolve_session(token, &state.auth.secret).ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. A valid session is not enough here: the role must be admin
    if !session.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    // 3. Inject
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, role: &str, expires_in: i64) -> String {
        let claims = SessionClaims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: (Utc::now() + Duration::seconds(expires_in)).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
            .unwrap()
    }

    #[test]
    fn test_valid_token_resolves() {
        let session = resolve_session(&token("42", "user", 3600), SECRET).unwrap();
        assert_eq!(session.user_id, 42);
        assert_eq!(session.role, Some(Role::User));
        assert!(!session.is_admin());
    }

    #[test]
    fn test_admin_token_resolves_with_admin_role() {
        let session = resolve_session(&token("7", "admin", 3600), SECRET).unwrap();
        assert!(session.is_admin());
    }

    #[test]
    fn test_non_numeric_subject_fails_closed() {
        assert!(resolve_session(&token("guest-abc", "user", 3600), SECRET).is_none());
    }

    #[test]
    fn test_unknown_role_yields_roleless_session() {
        let session = resolve_session(&token("42", "superuser", 3600), SECRET).unwrap();
        assert_eq!(session.role, None);
        assert!(!session.is_admin());
    }

    #[test]
    fn test_wrong_secret_fails_closed() {
        assert!(resolve_session(&token("42", "user", 3600), "other-secret").is_none());
    }

    #[test]
    fn test_expired_token_fails_closed() {
        // Well past the default validation leeway
        assert!(resolve_session(&token("42", "user", -600), SECRET).is_none());
    }
}
