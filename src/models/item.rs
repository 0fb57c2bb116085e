use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::items;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = items)]
#[diesel(belongs_to(crate::models::restaurant::Restaurant))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Item {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub discount: i32,
    pub state: String,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = items)]
pub struct NewItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub discount: i32,
    pub state: String,
    pub photo: Option<String>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = items)]
pub struct ItemChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub discount: Option<i32>,
    pub state: Option<String>,
    pub photo: Option<String>,
}
