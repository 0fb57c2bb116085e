use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::services::report::{self, ReportPeriod, SalesReport};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SalesReportParams {
    /// "today", "last_week" or "last_month"
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReportItemResponse {
    pub name: String,
    pub photo: Option<String>,
    pub total_count: i64,
    /// Revenue net of per-line discounts, as a decimal string
    pub total_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReportResponse {
    pub filter: String,
    pub total_income: String,
    pub items: Vec<SalesReportItemResponse>,
}

impl From<SalesReport> for SalesReportResponse {
    fn from(report: SalesReport) -> Self {
        SalesReportResponse {
            filter: report.filter.to_string(),
            total_income: report.total_income.to_string(),
            items: report
                .items
                .into_iter()
                .map(|item| SalesReportItemResponse {
                    name: item.name,
                    photo: item.photo,
                    total_count: item.total_count,
                    total_price: item.total_price.to_string(),
                })
                .collect(),
        }
    }
}

/// GET /api/restaurant/sales-reports
#[utoipa::path(
    get,
    path = "/api/restaurant/sales-reports",
    params(("filter" = String, Query, description = "Report window: today, last_week or last_month")),
    responses(
        (status = 200, description = "Per-item sales over the window", body = SalesReportResponse),
        (status = 400, description = "Invalid filter option"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Restaurant not found"),
    ),
    tag = "restaurant"
)]
pub async fn sales_report(
    pool: web::Data<DbPool>,
    req: HttpRequest,
    query: web::Query<SalesReportParams>,
) -> Result<HttpResponse, AppError> {
    let principal_id = auth::principal_id(&req)?;
    let period = query
        .into_inner()
        .filter
        .as_deref()
        .and_then(ReportPeriod::parse)
        .ok_or_else(|| {
            AppError::validation("Invalid filter option. Use 'today', 'last_week', or 'last_month'.")
        })?;

    let report = web::block(move || {
        let mut conn = pool.get()?;
        let principal = auth::load_principal(&mut conn, principal_id)?;
        principal.require(Role::RestaurantManager)?;
        report::sales_report(&mut conn, principal.id(), period)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(SalesReportResponse::from(report)))
}
