use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{cart_items, carts};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub total_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub total_price: BigDecimal,
}

/// A cart line. `price` and `discount` are snapshots of the item at the time
/// it was added, decoupled from later catalog edits.
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = cart_items)]
#[diesel(belongs_to(Cart))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub item_id: Uuid,
    pub count: i32,
    pub price: BigDecimal,
    pub discount: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub item_id: Uuid,
    pub count: i32,
    pub price: BigDecimal,
    pub discount: i32,
}
