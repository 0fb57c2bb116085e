use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{customer_profiles, favorites};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customer_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: String,
    pub address: Option<String>,
    pub latitude: Option<BigDecimal>,
    pub longitude: Option<BigDecimal>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customer_profiles)]
pub struct NewCustomerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = favorites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
}
