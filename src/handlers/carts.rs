use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::services::cart::{self, CartLineView, CartView};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub restaurant_id: Uuid,
    pub item_id: Uuid,
    pub count: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub cart_item_id: Uuid,
    pub count: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListCartsParams {
    #[serde(default)]
    pub restaurant_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub item: Uuid,
    pub name: String,
    pub discount: i32,
    pub count: i32,
    /// Snapshot price as a decimal string, e.g. "9.99"
    pub price: String,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub restaurant: Uuid,
    pub restaurant_name: String,
    pub total_price: String,
    pub cart_items: Vec<CartItemResponse>,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        CartResponse {
            id: view.id,
            restaurant: view.restaurant,
            restaurant_name: view.restaurant_name,
            total_price: view.total_price.to_string(),
            cart_items: view.cart_items.into_iter().map(CartItemResponse::from).collect(),
        }
    }
}

impl From<CartLineView> for CartItemResponse {
    fn from(line: CartLineView) -> Self {
        CartItemResponse {
            id: line.id,
            item: line.item,
            name: line.name,
            discount: line.discount,
            count: line.count,
            price: line.price.to_string(),
            photo: line.photo,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/customer/carts
#[utoipa::path(
    post,
    path = "/api/customer/carts",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Item added to cart", body = CartResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Item or Restaurant not found"),
    ),
    tag = "carts"
)]
pub async fn add_to_cart(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let body = body.into_inner();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        cart::add_item(
            &mut conn,
            principal.id(),
            body.restaurant_id,
            body.item_id,
            body.count,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CartResponse::from(view)))
}

/// GET /api/customer/carts
#[utoipa::path(
    get,
    path = "/api/customer/carts",
    params(("restaurant_id" = Option<Uuid>, Query, description = "Filter carts by restaurant")),
    responses(
        (status = 200, description = "The caller's carts", body = [CartResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "carts"
)]
pub async fn list_carts(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    query: web::Query<ListCartsParams>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let restaurant_id = query.into_inner().restaurant_id;

    let views = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        cart::list_carts(&mut conn, principal.id(), restaurant_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let response: Vec<CartResponse> = views.into_iter().map(CartResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/customer/carts/{id}
#[utoipa::path(
    get,
    path = "/api/customer/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart UUID")),
    responses(
        (status = 200, description = "Cart details", body = CartResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cart not found"),
    ),
    tag = "carts"
)]
pub async fn get_cart(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let cart_id = path.into_inner();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        cart::get_cart(&mut conn, principal.id(), cart_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(view)))
}

/// PUT /api/customer/carts/{id}
#[utoipa::path(
    put,
    path = "/api/customer/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart UUID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Cart item updated", body = CartResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cart or Cart item not found"),
    ),
    tag = "carts"
)]
pub async fn update_cart_item(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let cart_id = path.into_inner();
    let body = body.into_inner();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        cart::update_item(
            &mut conn,
            principal.id(),
            cart_id,
            body.cart_item_id,
            body.count,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match view {
        Some(view) => Ok(HttpResponse::Ok().json(CartResponse::from(view))),
        None => Ok(HttpResponse::Ok().json(json!({ "message": "Cart deleted." }))),
    }
}

/// DELETE /api/customer/carts/{id}
#[utoipa::path(
    delete,
    path = "/api/customer/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart UUID")),
    responses(
        (status = 200, description = "Cart deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cart not found"),
    ),
    tag = "carts"
)]
pub async fn delete_cart(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let cart_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        cart::delete_cart(&mut conn, principal.id(), cart_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Cart deleted." })))
}

/// DELETE /api/customer/carts/{id}/items/{cart_item_id}
#[utoipa::path(
    delete,
    path = "/api/customer/carts/{id}/items/{cart_item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
        ("cart_item_id" = Uuid, Path, description = "Cart item UUID"),
    ),
    responses(
        (status = 200, description = "Cart item deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cart or Cart item not found"),
    ),
    tag = "carts"
)]
pub async fn delete_cart_item(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let (cart_id, cart_item_id) = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        cart::remove_item(&mut conn, principal.id(), cart_id, cart_item_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Cart item deleted." })))
}
