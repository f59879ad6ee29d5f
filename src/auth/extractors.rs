use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::{Claims, JwtKeys};
use crate::auth::repo::{Role, User};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller: verified claims plus the live user row. The user is
/// re-fetched on every request; tokens are not revoked on deletion, so this
/// recheck is the only safeguard against a vanished account.
pub struct AuthUser {
    pub user: User,
    pub claims: Claims,
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid token".into())
        })?;

        let user = User::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for deleted user");
                ApiError::Unauthorized("User not found".into())
            })?;

        Ok(AuthUser { user, claims })
    }
}

/// Role gate over verified claims. No route applies it today: every
/// authenticated role may read and mutate courses.
#[allow(dead_code)]
pub fn require_role(claims: &Claims, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Insufficient permissions".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with_role(role: Role) -> Claims {
        Claims {
            sub: "1700000000000".into(),
            email: "a@x.com".into(),
            role,
            iat: 0,
            exp: usize::MAX,
        }
    }

    #[test]
    fn bearer_token_requires_the_scheme() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(Some("bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(Some("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(Some("abc.def.ghi")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn require_role_allows_listed_roles() {
        let claims = claims_with_role(Role::Instructor);
        assert!(require_role(&claims, &[Role::Admin, Role::Instructor]).is_ok());
    }

    #[test]
    fn require_role_rejects_with_forbidden() {
        let claims = claims_with_role(Role::Student);
        let err = require_role(&claims, &[Role::Admin]).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }
}
