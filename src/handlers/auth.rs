use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::User;
use crate::services::password;
use crate::services::registration::{register_user, SignupProfile};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerSignUpRequest {
    pub phone_number: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestaurantSignUpRequest {
    pub phone_number: String,
    pub password: String,
    pub name: String,
    pub business_type: String,
    pub city_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignUpResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl From<User> for SignUpResponse {
    fn from(user: User) -> Self {
        SignUpResponse {
            id: user.id,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/auth/signup/customer
#[utoipa::path(
    post,
    path = "/api/auth/signup/customer",
    request_body = CustomerSignUpRequest,
    responses(
        (status = 201, description = "Customer registered", body = SignUpResponse),
        (status = 400, description = "Duplicate phone number or invalid data"),
    ),
    tag = "auth"
)]
pub async fn signup_customer(
    pool: web::Data<DbPool>,
    body: web::Json<CustomerSignUpRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let user = web::block(move || {
        let mut conn = pool.get()?;
        register_user(
            &mut conn,
            &body.phone_number,
            &body.password,
            SignupProfile::Customer {
                first_name: body.first_name,
                last_name: body.last_name,
                state: body.state,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(SignUpResponse::from(user)))
}

/// POST /api/auth/signup/restaurant
#[utoipa::path(
    post,
    path = "/api/auth/signup/restaurant",
    request_body = RestaurantSignUpRequest,
    responses(
        (status = 201, description = "Restaurant manager registered", body = SignUpResponse),
        (status = 400, description = "Duplicate phone number or invalid data"),
    ),
    tag = "auth"
)]
pub async fn signup_restaurant(
    pool: web::Data<DbPool>,
    body: web::Json<RestaurantSignUpRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let user = web::block(move || {
        let mut conn = pool.get()?;
        register_user(
            &mut conn,
            &body.phone_number,
            &body.password,
            SignupProfile::RestaurantManager {
                name: body.name,
                business_type: body.business_type,
                city_name: body.city_name,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(SignUpResponse::from(user)))
}

/// POST /api/auth/password
#[utoipa::path(
    post,
    path = "/api/auth/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Old password is incorrect"),
        (status = 401, description = "Unauthorized"),
    ),
    tag = "auth"
)]
pub async fn change_password(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<PasswordChangeRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let body = body.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        password::change_password(
            &mut conn,
            principal.id(),
            &body.old_password,
            &body.new_password,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password changed successfully." })))
}
