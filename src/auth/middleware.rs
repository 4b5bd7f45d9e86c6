//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::auth::{error::AuthError, jwt::JwtHandler, models::Identity};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Pull the bearer token out of the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Unauthorized)?
        .to_str()
        .map_err(|_| AuthError::Unauthorized)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::Unauthorized);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Unauthorized);
    }
    Ok(token)
}

/// Auth middleware that validates JWT tokens and attaches the caller's identity
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?;

    let identity = match jwt_handler.verify(token) {
        Ok(identity) => identity,
        Err(e) => {
            // Clients only ever see "unauthorized"; the reason stays in the logs
            warn!(path = %req.uri().path(), reason = %e, "Rejected bearer token");
            return Err(AuthError::Unauthorized);
        }
    };

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extract identity from request (use after auth middleware)
pub fn extract_identity(req: &Request) -> Option<&Identity> {
    req.extensions().get::<Identity>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use axum::{body::Body, http::HeaderValue};
    use uuid::Uuid;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers_with("bearer  abc")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_or_malformed_header_is_unauthorized() {
        for value in ["", "Bearer", "Bearer   ", "Basic dXNlcjpwYXNz", "abc.def.ghi"] {
            assert!(
                matches!(bearer_token(&headers_with(value)), Err(AuthError::Unauthorized)),
                "{value:?} should be rejected"
            );
        }
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_extract_identity_from_request() {
        let mut req = Request::new(Body::empty());
        assert!(extract_identity(&req).is_none());

        let identity = Identity {
            id: Uuid::new_v4(),
            role: Role::FinanceHead,
        };
        req.extensions_mut().insert(identity);

        assert_eq!(extract_identity(&req), Some(&identity));
    }
}
