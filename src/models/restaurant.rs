use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::restaurants;

/// Moderation state of a restaurant profile. New restaurants start `pending`
/// and only `approved` ones appear in public search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<ApprovalState> {
        match value {
            "pending" => Some(ApprovalState::Pending),
            "approved" => Some(ApprovalState::Approved),
            "rejected" => Some(ApprovalState::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Restaurant {
    pub id: Uuid,
    pub manager_id: Uuid,
    pub name: String,
    pub business_type: String,
    pub city_name: String,
    pub state: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<BigDecimal>,
    pub longitude: Option<BigDecimal>,
    pub open_hour: Option<NaiveTime>,
    pub close_hour: Option<NaiveTime>,
    pub delivery_price: BigDecimal,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub id: Uuid,
    pub manager_id: Uuid,
    pub name: String,
    pub business_type: String,
    pub city_name: String,
    pub state: String,
}

/// Partial update for the manager-facing profile endpoint. `None` fields are
/// left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = restaurants)]
pub struct RestaurantChangeset {
    pub name: Option<String>,
    pub business_type: Option<String>,
    pub city_name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<BigDecimal>,
    pub longitude: Option<BigDecimal>,
    pub open_hour: Option<NaiveTime>,
    pub close_hour: Option<NaiveTime>,
    pub delivery_price: Option<BigDecimal>,
    pub photo: Option<String>,
}
