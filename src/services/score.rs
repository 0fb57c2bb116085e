use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::schema::{order_items, orders, reviews};

/// Mean review score across all of a restaurant's orders, rounded to two
/// decimals, 0.0 when nothing has been reviewed yet. Computed on read.
pub fn restaurant_score(conn: &mut PgConnection, restaurant_id: Uuid) -> Result<f64, AppError> {
    let scores: Vec<i32> = reviews::table
        .inner_join(orders::table)
        .filter(orders::restaurant_id.eq(restaurant_id))
        .select(reviews::score)
        .load(conn)?;
    Ok(mean_score(&scores))
}

/// Same aggregation restricted to orders that contained the item.
pub fn item_score(conn: &mut PgConnection, item_id: Uuid) -> Result<f64, AppError> {
    let order_ids: Vec<Uuid> = order_items::table
        .filter(order_items::item_id.eq(item_id))
        .select(order_items::order_id)
        .load(conn)?;
    let scores: Vec<i32> = reviews::table
        .filter(reviews::order_id.eq_any(order_ids))
        .select(reviews::score)
        .load(conn)?;
    Ok(mean_score(&scores))
}

fn mean_score(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: f64 = scores.iter().map(|score| f64::from(*score)).sum();
    let mean = sum / scores.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::mean_score;

    #[test]
    fn no_reviews_means_zero_not_an_error() {
        assert_eq!(mean_score(&[]), 0.0);
    }

    #[test]
    fn mean_is_rounded_to_two_decimals() {
        assert_eq!(mean_score(&[5, 3]), 4.0);
        assert_eq!(mean_score(&[5, 4, 4]), 4.33);
        assert_eq!(mean_score(&[1, 2]), 1.5);
    }
}
