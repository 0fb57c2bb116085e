use std::str::FromStr;

use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::customer::{CustomerProfile, Favorite, NewFavorite};
use crate::models::user::Role;
use crate::schema::{customer_profiles, favorites, restaurants, users};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct NestedUserResponse {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerProfileResponse {
    pub user: NestedUserResponse,
    pub state: String,
    pub address: Option<String>,
    /// Decimal degrees as a string, e.g. "35.689700"
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NestedUserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerProfileUpdateRequest {
    #[serde(default)]
    pub user: Option<NestedUserUpdate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub restaurant: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFavoriteRequest {
    pub restaurant_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFavoriteParams {
    pub restaurant_id: Uuid,
}

fn parse_coordinate(field: &str, value: Option<String>) -> Result<Option<BigDecimal>, AppError> {
    value
        .map(|raw| {
            BigDecimal::from_str(&raw)
                .map_err(|_| AppError::validation(format!("Invalid {field}: '{raw}'")))
        })
        .transpose()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/customer/profile
#[utoipa::path(
    get,
    path = "/api/customer/profile",
    responses(
        (status = 200, description = "Customer profile", body = CustomerProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Customer profile not found"),
    ),
    tag = "customer"
)]
pub async fn get_profile(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;

        let profile: CustomerProfile = customer_profiles::table
            .filter(customer_profiles::user_id.eq(principal.id()))
            .select(CustomerProfile::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Customer profile not found."))?;

        Ok::<_, AppError>(CustomerProfileResponse {
            user: NestedUserResponse {
                phone_number: principal.user.phone_number,
                first_name: principal.user.first_name,
                last_name: principal.user.last_name,
                role: principal.user.role,
            },
            state: profile.state,
            address: profile.address,
            latitude: profile.latitude.map(|v| v.to_string()),
            longitude: profile.longitude.map(|v| v.to_string()),
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// PUT /api/customer/profile
#[utoipa::path(
    put,
    path = "/api/customer/profile",
    request_body = CustomerProfileUpdateRequest,
    responses(
        (status = 200, description = "Customer profile updated"),
        (status = 400, description = "Invalid data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Customer profile not found"),
    ),
    tag = "customer"
)]
pub async fn update_profile(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<CustomerProfileUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let body = body.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;

        let latitude = parse_coordinate("latitude", body.latitude)?;
        let longitude = parse_coordinate("longitude", body.longitude)?;

        conn.transaction::<_, AppError, _>(|conn| {
            let profile: CustomerProfile = customer_profiles::table
                .filter(customer_profiles::user_id.eq(principal.id()))
                .select(CustomerProfile::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| AppError::not_found("Customer profile not found."))?;

            if let Some(user_update) = body.user {
                if let Some(first_name) = user_update.first_name {
                    diesel::update(users::table.find(principal.id()))
                        .set(users::first_name.eq(first_name))
                        .execute(conn)?;
                }
                if let Some(last_name) = user_update.last_name {
                    diesel::update(users::table.find(principal.id()))
                        .set(users::last_name.eq(last_name))
                        .execute(conn)?;
                }
            }

            if let Some(address) = body.address {
                diesel::update(customer_profiles::table.find(profile.id))
                    .set(customer_profiles::address.eq(address))
                    .execute(conn)?;
            }
            if let Some(latitude) = latitude {
                diesel::update(customer_profiles::table.find(profile.id))
                    .set(customer_profiles::latitude.eq(latitude))
                    .execute(conn)?;
            }
            if let Some(longitude) = longitude {
                diesel::update(customer_profiles::table.find(profile.id))
                    .set(customer_profiles::longitude.eq(longitude))
                    .execute(conn)?;
            }
            Ok(())
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Customer profile updated successfully." })))
}

/// GET /api/customer/favorites
#[utoipa::path(
    get,
    path = "/api/customer/favorites",
    responses(
        (status = 200, description = "Favorite restaurants", body = [FavoriteResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "customer"
)]
pub async fn list_favorites(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;

        let rows: Vec<Favorite> = favorites::table
            .filter(favorites::user_id.eq(principal.id()))
            .select(Favorite::as_select())
            .load(&mut conn)?;
        Ok::<_, AppError>(
            rows.into_iter()
                .map(|favorite| FavoriteResponse {
                    id: favorite.id,
                    user: favorite.user_id,
                    restaurant: favorite.restaurant_id,
                })
                .collect::<Vec<_>>(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/customer/favorites
#[utoipa::path(
    post,
    path = "/api/customer/favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Favorite added", body = FavoriteResponse),
        (status = 400, description = "Already a favorite"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Restaurant not found"),
    ),
    tag = "customer"
)]
pub async fn add_favorite(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<AddFavoriteRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let restaurant_id = body.into_inner().restaurant_id;

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;

        conn.transaction::<_, AppError, _>(|conn| {
            restaurants::table
                .filter(restaurants::id.eq(restaurant_id))
                .select(restaurants::id)
                .first::<Uuid>(conn)
                .optional()?
                .ok_or_else(|| AppError::not_found("Restaurant not found."))?;

            let already: i64 = favorites::table
                .filter(favorites::user_id.eq(principal.id()))
                .filter(favorites::restaurant_id.eq(restaurant_id))
                .count()
                .get_result(conn)?;
            if already > 0 {
                return Err(AppError::validation(
                    "This restaurant is already in your favorites.",
                ));
            }

            let favorite: Favorite = diesel::insert_into(favorites::table)
                .values(&NewFavorite {
                    id: Uuid::new_v4(),
                    user_id: principal.id(),
                    restaurant_id,
                })
                .returning(Favorite::as_returning())
                .get_result(conn)?;
            Ok(FavoriteResponse {
                id: favorite.id,
                user: favorite.user_id,
                restaurant: favorite.restaurant_id,
            })
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(response))
}

/// DELETE /api/customer/favorites?restaurant_id=
#[utoipa::path(
    delete,
    path = "/api/customer/favorites",
    params(("restaurant_id" = Uuid, Query, description = "Restaurant to remove from favorites")),
    responses(
        (status = 200, description = "Favorite removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Favorite not found"),
    ),
    tag = "customer"
)]
pub async fn remove_favorite(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    query: web::Query<RemoveFavoriteParams>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let restaurant_id = query.into_inner().restaurant_id;

    web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;

        let deleted = diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(principal.id()))
                .filter(favorites::restaurant_id.eq(restaurant_id)),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(AppError::not_found("Favorite not found."));
        }
        Ok(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Favorite removed successfully." })))
}
