use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::customer::NewCustomerProfile;
use crate::models::restaurant::{ApprovalState, NewRestaurant};
use crate::models::user::{NewUser, Role, User};
use crate::schema::{customer_profiles, restaurants, users};

use super::password::hash_password;

/// Role-specific registration payload. Each variant owns its profile
/// construction; an unrecognized role never gets this far because the
/// handler picks the variant.
#[derive(Debug, Clone)]
pub enum SignupProfile {
    Customer {
        first_name: String,
        last_name: String,
        state: Option<String>,
    },
    RestaurantManager {
        name: String,
        business_type: String,
        city_name: String,
    },
}

impl SignupProfile {
    pub fn role(&self) -> Role {
        match self {
            SignupProfile::Customer { .. } => Role::Customer,
            SignupProfile::RestaurantManager { .. } => Role::RestaurantManager,
        }
    }
}

/// Creates the user row and its role profile in one transaction. Customer
/// profiles default to `approved` (the payload may override); restaurant
/// profiles always start `pending` awaiting moderation.
pub fn register_user(
    conn: &mut PgConnection,
    phone_number: &str,
    password: &str,
    profile: SignupProfile,
) -> Result<User, AppError> {
    let password_hash = hash_password(password)?;

    conn.transaction::<_, AppError, _>(|conn| {
        let taken: i64 = users::table
            .filter(users::phone_number.eq(phone_number))
            .count()
            .get_result(conn)?;
        if taken > 0 {
            return Err(AppError::validation(
                "A user with this phone number already exists.",
            ));
        }

        let (first_name, last_name) = match &profile {
            SignupProfile::Customer {
                first_name,
                last_name,
                ..
            } => (first_name.clone(), last_name.clone()),
            SignupProfile::RestaurantManager { .. } => (String::new(), String::new()),
        };

        let user: User = diesel::insert_into(users::table)
            .values(&NewUser {
                id: Uuid::new_v4(),
                phone_number: phone_number.to_string(),
                password_hash,
                first_name,
                last_name,
                role: profile.role().as_str().to_string(),
            })
            .returning(User::as_returning())
            .get_result(conn)?;

        match profile {
            SignupProfile::Customer { state, .. } => {
                diesel::insert_into(customer_profiles::table)
                    .values(&NewCustomerProfile {
                        id: Uuid::new_v4(),
                        user_id: user.id,
                        state: state.unwrap_or_else(|| "approved".to_string()),
                    })
                    .execute(conn)?;
            }
            SignupProfile::RestaurantManager {
                name,
                business_type,
                city_name,
            } => {
                diesel::insert_into(restaurants::table)
                    .values(&NewRestaurant {
                        id: Uuid::new_v4(),
                        manager_id: user.id,
                        name,
                        business_type,
                        city_name,
                        state: ApprovalState::Pending.as_str().to_string(),
                    })
                    .execute(conn)?;
            }
        }

        Ok(user)
    })
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;

    use super::{register_user, SignupProfile};
    use crate::errors::AppError;
    use crate::models::customer::CustomerProfile;
    use crate::models::restaurant::Restaurant;
    use crate::schema::{customer_profiles, restaurants};
    use crate::test_support::setup_db;

    #[tokio::test]
    async fn register_customer_creates_approved_profile() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");

        let user = register_user(
            &mut conn,
            "1234567890",
            "strong-password",
            SignupProfile::Customer {
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                state: None,
            },
        )
        .expect("registration failed");

        assert_eq!(user.role, "customer");

        let profile: CustomerProfile = customer_profiles::table
            .filter(customer_profiles::user_id.eq(user.id))
            .select(CustomerProfile::as_select())
            .first(&mut conn)
            .expect("profile should exist");
        assert_eq!(profile.state, "approved");
    }

    #[tokio::test]
    async fn register_restaurant_manager_creates_pending_profile() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");

        let manager = register_user(
            &mut conn,
            "0987654321",
            "strong-password",
            SignupProfile::RestaurantManager {
                name: "Test Restaurant".to_string(),
                business_type: "restaurant".to_string(),
                city_name: "Test City".to_string(),
            },
        )
        .expect("registration failed");

        assert_eq!(manager.role, "restaurant_manager");

        let restaurant: Restaurant = restaurants::table
            .filter(restaurants::manager_id.eq(manager.id))
            .select(Restaurant::as_select())
            .first(&mut conn)
            .expect("restaurant should exist");
        assert_eq!(restaurant.state, "pending");
        assert_eq!(restaurant.name, "Test Restaurant");
        assert_eq!(restaurant.city_name, "Test City");
    }

    #[tokio::test]
    async fn duplicate_phone_number_is_rejected() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");

        let profile = SignupProfile::Customer {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            state: None,
        };

        register_user(&mut conn, "5550001111", "pw-one", profile.clone())
            .expect("first registration failed");

        let err = register_user(&mut conn, "5550001111", "pw-two", profile)
            .expect_err("duplicate phone must be rejected");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
