use actix_web::HttpRequest;
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Role, User};
use crate::schema::users;

/// Header carrying the authenticated user id, set by the upstream auth
/// gateway. Token issuance and verification live outside this service.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The authenticated caller, threaded explicitly into every operation.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub role: Role,
}

impl Principal {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

pub fn principal_id(req: &HttpRequest) -> Result<Uuid, AppError> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    Uuid::parse_str(raw).map_err(|_| AppError::Unauthorized)
}

pub fn load_principal(conn: &mut PgConnection, id: Uuid) -> Result<Principal, AppError> {
    let user = users::table
        .filter(users::id.eq(id))
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or(AppError::Unauthorized)?;
    let role = user.role().ok_or(AppError::Unauthorized)?;
    Ok(Principal { user, role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            phone_number: "1234567890".to_string(),
            password_hash: String::new(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn require_matching_role_passes() {
        let user = user_with_role("customer");
        let principal = Principal {
            role: Role::Customer,
            user,
        };
        assert!(principal.require(Role::Customer).is_ok());
    }

    #[test]
    fn require_other_role_is_forbidden() {
        let user = user_with_role("customer");
        let principal = Principal {
            role: Role::Customer,
            user,
        };
        assert!(matches!(
            principal.require(Role::RestaurantManager),
            Err(AppError::Forbidden)
        ));
    }
}
