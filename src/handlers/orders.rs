use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::order::{DeliveryMethod, PaymentMethod};
use crate::models::user::Role;
use crate::services::order::{self, OrderLineView, OrderView};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cart_id: Uuid,
    /// "delivery" or "pickup"
    pub delivery_method: String,
    /// "online" or "in_person"
    pub payment_method: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderHistoryParams {
    /// Maximum number of most recent orders to return (default: 10)
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusUpdateRequest {
    pub state: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub item: Uuid,
    pub name: String,
    pub discount: i32,
    pub count: i32,
    pub price: String,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub restaurant: Uuid,
    pub restaurant_name: String,
    pub order_date: String,
    pub total_price: String,
    pub state: String,
    pub delivery_method: String,
    pub payment_method: String,
    pub description: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub address: Option<String>,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        OrderResponse {
            order_id: view.order_id,
            restaurant: view.restaurant,
            restaurant_name: view.restaurant_name,
            order_date: view.order_date.to_rfc3339(),
            total_price: view.total_price.to_string(),
            state: view.state,
            delivery_method: view.delivery_method,
            payment_method: view.payment_method,
            description: view.description,
            latitude: view.latitude.map(|v| v.to_string()),
            longitude: view.longitude.map(|v| v.to_string()),
            address: view.address,
            order_items: view.order_items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

impl From<OrderLineView> for OrderItemResponse {
    fn from(line: OrderLineView) -> Self {
        OrderItemResponse {
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

// ── Customer handlers ────────────────────────────────────────────────────────

/// GET /api/customer/orders
#[utoipa::path(
    get,
    path = "/api/customer/orders",
    responses(
        (status = 200, description = "The caller's orders", body = [OrderResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;

    let views = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        order::list_user_orders(&mut conn, principal.id(), None)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let response: Vec<OrderResponse> = views.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/customer/orders
///
/// Converts a cart into an order. The cart and its lines are consumed by the
/// same transaction that writes the order, so a failure leaves the cart as
/// it was.
#[utoipa::path(
    post,
    path = "/api/customer/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cart not found"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let body = body.into_inner();

    let delivery_method = DeliveryMethod::parse(&body.delivery_method).ok_or_else(|| {
        AppError::validation(format!("\"{}\" is not a valid choice.", body.delivery_method))
    })?;
    let payment_method = PaymentMethod::parse(&body.payment_method).ok_or_else(|| {
        AppError::validation(format!("\"{}\" is not a valid choice.", body.payment_method))
    })?;

    let order_id = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        order::create_order(
            &mut conn,
            principal.id(),
            body.cart_id,
            delivery_method,
            payment_method,
            body.description.unwrap_or_default(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(json!({
        "order_id": order_id,
        "message": "Order created successfully!"
    })))
}

/// GET /api/customer/orders/history
#[utoipa::path(
    get,
    path = "/api/customer/orders/history",
    params(("limit" = Option<i64>, Query, description = "Maximum number of orders (default 10)")),
    responses(
        (status = 200, description = "Most recent orders", body = [OrderResponse]),
        (status = 400, description = "Invalid limit"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "orders"
)]
pub async fn order_history(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    query: web::Query<OrderHistoryParams>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let limit = query.into_inner().limit.unwrap_or(10);
    if limit < 1 {
        return Err(AppError::validation(
            "Invalid 'limit' parameter. It must be a positive integer.",
        ));
    }

    let views = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        order::list_user_orders(&mut conn, principal.id(), Some(limit))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let response: Vec<OrderResponse> = views.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

// ── Manager handlers ─────────────────────────────────────────────────────────

/// GET /api/restaurant/orders
#[utoipa::path(
    get,
    path = "/api/restaurant/orders",
    responses(
        (status = 200, description = "Orders of the manager's restaurant", body = [OrderResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Restaurant not found"),
    ),
    tag = "orders"
)]
pub async fn restaurant_orders(
    pool: web::Data<DbPool>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;

    let views = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        order::list_restaurant_orders(&mut conn, principal.id())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let response: Vec<OrderResponse> = views.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// PATCH /api/restaurant/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/restaurant/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = OrderStatusUpdateRequest,
    responses(
        (status = 200, description = "Order status updated"),
        (status = 400, description = "Unknown state or illegal transition"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<OrderStatusUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let order_id = path.into_inner();
    let next_state = body.into_inner().state;

    web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        order::update_status(&mut conn, principal.id(), order_id, &next_state)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Order status updated successfully" })))
}
