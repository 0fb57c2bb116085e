use argon2::password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHash};
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::schema::users;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn change_password(
    conn: &mut PgConnection,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let stored: String = users::table
        .filter(users::id.eq(user_id))
        .select(users::password_hash)
        .first(conn)
        .optional()?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(old_password, &stored) {
        return Err(AppError::validation("Old password is incorrect."));
    }

    let new_hash = hash_password(new_password)?;
    diesel::update(users::table.filter(users::id.eq(user_id)))
        .set(users::password_hash.eq(new_hash))
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("strong-password").expect("hashing failed");
        assert!(verify_password("strong-password", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn garbage_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
