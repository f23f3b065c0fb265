//! Authorization gate: bearer-token extraction, principal resolution and
//! static role checks.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::models::{Event, Role, User};
use crate::state::AppState;
use crate::utils::error::AppError;

pub mod jwt;
pub mod password;

/// Accepted roles per endpoint group.
pub const EVENT_READ: &[Role] = &[Role::Admin, Role::Owner, Role::Assistant];
pub const EVENT_WRITE: &[Role] = &[Role::Admin, Role::Owner];
pub const TICKET_CREATE: &[Role] = &[Role::Assistant];
pub const USER_ADMIN: &[Role] = &[Role::Admin];
pub const SELF_SERVICE: &[Role] = &[Role::Admin, Role::Owner, Role::Assistant];
pub const CATALOG_WRITE: &[Role] = &[Role::Admin, Role::Owner];

/// The authenticated principal, resolved from the bearer token.
///
/// Extraction fails closed: a missing/malformed/expired token, an unknown
/// subject or an inactive account all reject the request before the
/// handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = jwt::decode_token(token, &state.config.jwt_secret)?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&claims.sub)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| {
                AppError::Unauthenticated("Could not validate credentials".to_string())
            })?;

        if !user.active {
            return Err(AppError::AccountInactive);
        }

        Ok(AuthUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_string()))
}

/// Single reusable role gate: set membership over the closed `Role` enum.
pub fn authorize(user: &User, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden("No has permission".to_string()))
    }
}

/// Owner check for event (and session) mutation: admins may act on any
/// event, owners only on their own.
pub fn authorize_event_mutation(user: &User, event: &Event) -> Result<(), AppError> {
    if user.role == Role::Admin || event.owner_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not owner of this event".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            fullname: "Test".to_string(),
            email: "test@example.com".to_string(),
            active: true,
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn event_owned_by(owner_id: Uuid) -> Event {
        Event {
            id: Uuid::new_v4(),
            name: "Conf".to_string(),
            description: None,
            date: Utc::now(),
            capacity: 10,
            status: crate::models::EventStatus::Created,
            location_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            owner_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_authorize_accepts_member_roles() {
        let admin = user_with_role(Role::Admin);
        let assistant = user_with_role(Role::Assistant);

        assert!(authorize(&admin, EVENT_WRITE).is_ok());
        assert!(authorize(&assistant, TICKET_CREATE).is_ok());
        assert!(authorize(&assistant, EVENT_READ).is_ok());
    }

    #[test]
    fn test_authorize_rejects_non_members() {
        let assistant = user_with_role(Role::Assistant);
        let owner = user_with_role(Role::Owner);

        assert!(matches!(
            authorize(&assistant, EVENT_WRITE),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize(&owner, USER_ADMIN),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize(&owner, TICKET_CREATE),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_owner_must_match_event_owner() {
        let owner = user_with_role(Role::Owner);
        let their_event = event_owned_by(owner.id);
        let someone_elses = event_owned_by(Uuid::new_v4());

        assert!(authorize_event_mutation(&owner, &their_event).is_ok());
        assert!(matches!(
            authorize_event_mutation(&owner, &someone_elses),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_bypasses_owner_check() {
        let admin = user_with_role(Role::Admin);
        let someone_elses = event_owned_by(Uuid::new_v4());
        assert!(authorize_event_mutation(&admin, &someone_elses).is_ok());
    }
}
