use std::str::FromStr;

use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{NaiveTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::item::{Item, ItemChangeset, NewItem};
use crate::models::restaurant::{ApprovalState, Restaurant, RestaurantChangeset};
use crate::models::user::Role;
use crate::schema::{items, restaurants};
use crate::services::order::restaurant_for_manager;
use crate::services::score;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: Uuid,
    pub name: String,
    pub business_type: String,
    pub city_name: String,
    pub state: String,
    /// Mean review score, recomputed on every read
    pub score: f64,
    pub delivery_price: String,
    pub address: Option<String>,
    pub description: Option<String>,
    /// "HH:MM:SS"
    pub open_hour: Option<String>,
    pub close_hour: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub restaurant: Uuid,
    pub price: String,
    pub discount: i32,
    pub name: String,
    pub description: Option<String>,
    pub state: String,
    pub photo: Option<String>,
    pub score: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub is_open: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub restaurants: Vec<RestaurantResponse>,
    pub items: Vec<ItemResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestaurantUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub open_hour: Option<String>,
    #[serde(default)]
    pub close_hour: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub delivery_price: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    #[serde(default)]
    pub discount: i32,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub discount: Option<i32>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

// ── Conversions and validation ───────────────────────────────────────────────

fn restaurant_response(
    conn: &mut PgConnection,
    restaurant: Restaurant,
) -> Result<RestaurantResponse, AppError> {
    let score = score::restaurant_score(conn, restaurant.id)?;
    Ok(RestaurantResponse {
        id: restaurant.id,
        name: restaurant.name,
        business_type: restaurant.business_type,
        city_name: restaurant.city_name,
        state: restaurant.state,
        score,
        delivery_price: restaurant.delivery_price.to_string(),
        address: restaurant.address,
        description: restaurant.description,
        open_hour: restaurant.open_hour.map(|t| t.to_string()),
        close_hour: restaurant.close_hour.map(|t| t.to_string()),
        latitude: restaurant.latitude.map(|v| v.to_string()),
        longitude: restaurant.longitude.map(|v| v.to_string()),
        photo: restaurant.photo,
    })
}

fn item_response(conn: &mut PgConnection, item: Item) -> Result<ItemResponse, AppError> {
    let score = score::item_score(conn, item.id)?;
    Ok(ItemResponse {
        id: item.id,
        restaurant: item.restaurant_id,
        price: item.price.to_string(),
        discount: item.discount,
        name: item.name,
        description: item.description,
        state: item.state,
        photo: item.photo,
        score,
    })
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    let price = BigDecimal::from_str(raw)
        .map_err(|_| AppError::validation(format!("Invalid price: '{raw}'")))?;
    if price < BigDecimal::from(0) {
        return Err(AppError::validation("Price must be non-negative."));
    }
    Ok(price)
}

fn validate_discount(discount: i32) -> Result<i32, AppError> {
    if !(0..=100).contains(&discount) {
        return Err(AppError::validation("Discount must be between 0 and 100."));
    }
    Ok(discount)
}

fn parse_hour(field: &str, raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::validation(format!("Invalid {field}: '{raw}'")))
}

fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw).map_err(|_| AppError::validation(format!("Invalid {field}: '{raw}'")))
}

fn is_open_now(restaurant: &Restaurant, now: NaiveTime) -> bool {
    match (restaurant.open_hour, restaurant.close_hour) {
        (Some(open), Some(close)) => open <= now && now <= close,
        _ => false,
    }
}

// ── Public catalog handlers ──────────────────────────────────────────────────

/// GET /api/restaurant/profiles
///
/// Public search across approved restaurants and all items. `query` matches
/// names case-insensitively, `is_open` compares the current time against the
/// restaurant's opening hours.
#[utoipa::path(
    get,
    path = "/api/restaurant/profiles",
    params(
        ("query" = Option<String>, Query, description = "Search term for restaurant and item names"),
        ("business_type" = Option<String>, Query, description = "Business type filter (partial match)"),
        ("is_open" = Option<String>, Query, description = "\"true\" for open now, \"false\" for closed"),
    ),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
    ),
    tag = "catalog"
)]
pub async fn search(
    pool: web::Data<DbPool>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;

        let mut restaurant_query = restaurants::table
            .filter(restaurants::state.eq(ApprovalState::Approved.as_str()))
            .select(Restaurant::as_select())
            .into_boxed();
        let mut item_query = items::table.select(Item::as_select()).into_boxed();

        if let Some(term) = params.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            restaurant_query = restaurant_query.filter(restaurants::name.ilike(pattern.clone()));
            item_query = item_query.filter(items::name.ilike(pattern));
        }
        if let Some(business_type) = params.business_type.as_deref() {
            restaurant_query =
                restaurant_query.filter(restaurants::business_type.ilike(format!("%{business_type}%")));
        }

        let mut matched: Vec<Restaurant> = restaurant_query.load(&mut conn)?;
        if let Some(is_open) = params.is_open.as_deref() {
            let now = Utc::now().time();
            match is_open.to_lowercase().as_str() {
                "true" => matched.retain(|r| is_open_now(r, now)),
                "false" => matched.retain(|r| !is_open_now(r, now)),
                _ => {}
            }
        }

        let matched_items: Vec<Item> = item_query.load(&mut conn)?;

        let restaurants = matched
            .into_iter()
            .map(|r| restaurant_response(&mut conn, r))
            .collect::<Result<Vec<_>, _>>()?;
        let items = matched_items
            .into_iter()
            .map(|i| item_response(&mut conn, i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok::<_, AppError>(SearchResponse { restaurants, items })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/restaurant/profiles/{id}
#[utoipa::path(
    get,
    path = "/api/restaurant/profiles/{id}",
    params(("id" = Uuid, Path, description = "Restaurant UUID")),
    responses(
        (status = 200, description = "Restaurant profile", body = RestaurantResponse),
        (status = 404, description = "Restaurant profile not found"),
    ),
    tag = "catalog"
)]
pub async fn get_restaurant(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = path.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let restaurant: Restaurant = restaurants::table
            .find(restaurant_id)
            .select(Restaurant::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Restaurant profile not found."))?;
        restaurant_response(&mut conn, restaurant)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/customer/restaurants/{restaurant_id}/items
#[utoipa::path(
    get,
    path = "/api/customer/restaurants/{restaurant_id}/items",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant UUID")),
    responses(
        (status = 200, description = "Menu items", body = [ItemResponse]),
        (status = 404, description = "Restaurant not found"),
    ),
    tag = "catalog"
)]
pub async fn menu_items(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = path.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;
        restaurants::table
            .filter(restaurants::id.eq(restaurant_id))
            .select(restaurants::id)
            .first::<Uuid>(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Restaurant not found"))?;

        let rows: Vec<Item> = items::table
            .filter(items::restaurant_id.eq(restaurant_id))
            .select(Item::as_select())
            .load(&mut conn)?;
        rows.into_iter()
            .map(|item| item_response(&mut conn, item))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/customer/restaurants/{restaurant_id}/items/{item_id}
#[utoipa::path(
    get,
    path = "/api/customer/restaurants/{restaurant_id}/items/{item_id}",
    params(
        ("restaurant_id" = Uuid, Path, description = "Restaurant UUID"),
        ("item_id" = Uuid, Path, description = "Item UUID"),
    ),
    responses(
        (status = 200, description = "Menu item", body = ItemResponse),
        (status = 404, description = "Item not found"),
    ),
    tag = "catalog"
)]
pub async fn menu_item_detail(
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (restaurant_id, item_id) = path.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let item: Item = items::table
            .filter(items::id.eq(item_id))
            .filter(items::restaurant_id.eq(restaurant_id))
            .select(Item::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Item not found"))?;
        item_response(&mut conn, item)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

// ── Manager-side handlers ────────────────────────────────────────────────────

/// GET /api/restaurant/profiles/me
#[utoipa::path(
    get,
    path = "/api/restaurant/profiles/me",
    responses(
        (status = 200, description = "Own restaurant profile", body = RestaurantResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Restaurant profile not found"),
    ),
    tag = "restaurant"
)]
pub async fn my_restaurant(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        let restaurant = restaurant_for_manager(&mut conn, principal.id())?;
        restaurant_response(&mut conn, restaurant)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// PUT /api/restaurant/profiles/me
#[utoipa::path(
    put,
    path = "/api/restaurant/profiles/me",
    request_body = RestaurantUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = RestaurantResponse),
        (status = 400, description = "Invalid request data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Restaurant profile not found"),
    ),
    tag = "restaurant"
)]
pub async fn update_my_restaurant(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<RestaurantUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let body = body.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        let restaurant = restaurant_for_manager(&mut conn, principal.id())?;

        let changes = RestaurantChangeset {
            name: body.name,
            business_type: body.business_type,
            city_name: body.city_name,
            address: body.address,
            description: body.description,
            latitude: body
                .latitude
                .as_deref()
                .map(|raw| parse_decimal("latitude", raw))
                .transpose()?,
            longitude: body
                .longitude
                .as_deref()
                .map(|raw| parse_decimal("longitude", raw))
                .transpose()?,
            open_hour: body
                .open_hour
                .as_deref()
                .map(|raw| parse_hour("open_hour", raw))
                .transpose()?,
            close_hour: body
                .close_hour
                .as_deref()
                .map(|raw| parse_hour("close_hour", raw))
                .transpose()?,
            delivery_price: body
                .delivery_price
                .as_deref()
                .map(parse_price)
                .transpose()?,
            photo: body.photo,
        };

        let updated: Restaurant = diesel::update(restaurants::table.find(restaurant.id))
            .set(&changes)
            .returning(Restaurant::as_returning())
            .get_result(&mut conn)?;
        restaurant_response(&mut conn, updated)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/restaurant/items
#[utoipa::path(
    get,
    path = "/api/restaurant/items",
    responses(
        (status = 200, description = "Own menu items", body = [ItemResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Restaurant profile not found"),
    ),
    tag = "restaurant"
)]
pub async fn list_my_items(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        let restaurant = restaurant_for_manager(&mut conn, principal.id())?;

        let rows: Vec<Item> = items::table
            .filter(items::restaurant_id.eq(restaurant.id))
            .select(Item::as_select())
            .load(&mut conn)?;
        rows.into_iter()
            .map(|item| item_response(&mut conn, item))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/restaurant/items
#[utoipa::path(
    post,
    path = "/api/restaurant/items",
    request_body = ItemCreateRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid price or discount"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Restaurant profile not found"),
    ),
    tag = "restaurant"
)]
pub async fn create_item(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<ItemCreateRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let body = body.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        let restaurant = restaurant_for_manager(&mut conn, principal.id())?;

        let price = parse_price(&body.price)?;
        let discount = validate_discount(body.discount)?;

        let item: Item = diesel::insert_into(items::table)
            .values(&NewItem {
                id: Uuid::new_v4(),
                restaurant_id: restaurant.id,
                name: body.name,
                description: body.description,
                price,
                discount,
                state: body.state.unwrap_or_else(|| "available".to_string()),
                photo: body.photo,
            })
            .returning(Item::as_returning())
            .get_result(&mut conn)?;
        item_response(&mut conn, item)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(response))
}

fn owned_item(
    conn: &mut PgConnection,
    manager_id: Uuid,
    item_id: Uuid,
) -> Result<Item, AppError> {
    let restaurant = restaurant_for_manager(conn, manager_id)?;
    items::table
        .filter(items::id.eq(item_id))
        .filter(items::restaurant_id.eq(restaurant.id))
        .select(Item::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Item not found."))
}

/// GET /api/restaurant/items/{id}
#[utoipa::path(
    get,
    path = "/api/restaurant/items/{id}",
    params(("id" = Uuid, Path, description = "Item UUID")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Item not found"),
    ),
    tag = "restaurant"
)]
pub async fn get_my_item(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let item_id = path.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        let item = owned_item(&mut conn, principal.id(), item_id)?;
        item_response(&mut conn, item)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// PUT /api/restaurant/items/{id}
#[utoipa::path(
    put,
    path = "/api/restaurant/items/{id}",
    params(("id" = Uuid, Path, description = "Item UUID")),
    request_body = ItemUpdateRequest,
    responses(
        (status = 200, description = "Updated item", body = ItemResponse),
        (status = 400, description = "Invalid price or discount"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Item not found"),
    ),
    tag = "restaurant"
)]
pub async fn update_my_item(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ItemUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let item_id = path.into_inner();
    let body = body.into_inner();

    let response = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        let item = owned_item(&mut conn, principal.id(), item_id)?;

        let changes = ItemChangeset {
            name: body.name,
            description: body.description,
            price: body.price.as_deref().map(parse_price).transpose()?,
            discount: body.discount.map(validate_discount).transpose()?,
            state: body.state,
            photo: body.photo,
        };

        let updated: Item = diesel::update(items::table.find(item.id))
            .set(&changes)
            .returning(Item::as_returning())
            .get_result(&mut conn)?;
        item_response(&mut conn, updated)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /api/restaurant/items/{id}
#[utoipa::path(
    delete,
    path = "/api/restaurant/items/{id}",
    params(("id" = Uuid, Path, description = "Item UUID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Item not found"),
    ),
    tag = "restaurant"
)]
pub async fn delete_my_item(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let item_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        let item = owned_item(&mut conn, principal.id(), item_id)?;
        diesel::delete(items::table.find(item.id)).execute(&mut conn)?;
        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
