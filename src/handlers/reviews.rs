use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::services::review::{self, ItemReviewView};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub order: Uuid,
    /// 1 to 5
    pub score: i32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub order: Uuid,
    pub score: i32,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemReviewResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub score: i32,
    pub description: String,
    pub order: Uuid,
}

impl From<ItemReviewView> for ItemReviewResponse {
    fn from(view: ItemReviewView) -> Self {
        ItemReviewResponse {
            id: view.id,
            first_name: view.first_name,
            last_name: view.last_name,
            score: view.score,
            description: view.description,
            order: view.order,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/customer/reviews/create
#[utoipa::path(
    post,
    path = "/api/customer/reviews/create",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Foreign order, duplicate review, or invalid score"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "reviews"
)]
pub async fn create_review(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let body = body.into_inner();

    let created = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::Customer)?;
        review::create_review(
            &mut conn,
            principal.id(),
            body.order,
            body.score,
            body.description.unwrap_or_default(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ReviewResponse {
        id: created.id,
        user: created.user_id,
        order: created.order_id,
        score: created.score,
        description: created.description,
    }))
}

/// GET /api/customer/items/{item_id}/reviews
#[utoipa::path(
    get,
    path = "/api/customer/items/{item_id}/reviews",
    params(("item_id" = Uuid, Path, description = "Item UUID")),
    responses(
        (status = 200, description = "Reviews for the item", body = [ItemReviewResponse]),
        (status = 404, description = "Item not found"),
    ),
    tag = "reviews"
)]
pub async fn item_reviews(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();

    let views = web::block(move || {
        let mut conn = pool.get()?;
        review::list_item_reviews(&mut conn, item_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let response: Vec<ItemReviewResponse> =
        views.into_iter().map(ItemReviewResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}
