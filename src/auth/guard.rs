//! Role Guard
//! Mission: Gate handlers on the caller's role

use crate::auth::{
    error::AuthError,
    middleware::extract_identity,
    models::{Identity, Role},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Roles allowed to create, edit and delete events
pub const EVENT_MANAGERS: &[Role] = &[Role::ClubAdmin, Role::SuperAdmin];

/// Decide whether an identity may proceed. No I/O, no side effects.
pub fn require_role<'a>(
    identity: Option<&'a Identity>,
    allowed: &[Role],
) -> Result<&'a Identity, AuthError> {
    let identity = identity.ok_or(AuthError::Unauthorized)?;
    if allowed.contains(&identity.role) {
        Ok(identity)
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Route layer wrapper around [`require_role`]. Must run inside `auth_middleware`.
pub async fn role_guard(
    State(allowed): State<&'static [Role]>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(e) = require_role(extract_identity(&req), allowed) {
        debug!(path = %req.uri().path(), "Role guard rejected request: {}", e);
        return Err(e);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_student_forbidden_from_event_management() {
        let student = identity(Role::Student);
        assert!(matches!(
            require_role(Some(&student), EVENT_MANAGERS),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn test_club_admin_allowed_event_management() {
        let admin = identity(Role::ClubAdmin);
        assert_eq!(require_role(Some(&admin), EVENT_MANAGERS).unwrap(), &admin);
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        assert!(matches!(
            require_role(None, EVENT_MANAGERS),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn test_role_matrix() {
        for role in Role::ALL {
            let who = identity(role);
            assert_eq!(
                require_role(Some(&who), EVENT_MANAGERS).is_ok(),
                matches!(role, Role::ClubAdmin | Role::SuperAdmin)
            );
            assert!(require_role(Some(&who), &Role::ALL).is_ok());
            assert!(matches!(
                require_role(Some(&who), &[]),
                Err(AuthError::Forbidden)
            ));
        }
    }
}
