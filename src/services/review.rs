use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::order::{Order, OrderState};
use crate::models::review::{NewReview, Review};
use crate::schema::{items, order_items, orders, reviews, users};

#[derive(Debug, Clone)]
pub struct ItemReviewView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub score: i32,
    pub description: String,
    pub order: Uuid,
}

/// One review per (order, user), authored by the order's owner, and only
/// once the order has reached `completed`. Re-submission is an error, not
/// an upsert.
pub fn create_review(
    conn: &mut PgConnection,
    user_id: Uuid,
    order_id: Uuid,
    score: i32,
    description: String,
) -> Result<Review, AppError> {
    if !(1..=5).contains(&score) {
        return Err(AppError::validation("Score must be between 1 and 5."));
    }

    conn.transaction::<_, AppError, _>(|conn| {
        let order: Order = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::user_id.eq(user_id))
            .select(Order::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                AppError::validation("You can only review orders that you have placed.")
            })?;

        if OrderState::parse(&order.state) != Some(OrderState::Completed) {
            return Err(AppError::validation(
                "Only completed orders can be reviewed.",
            ));
        }

        let already: i64 = reviews::table
            .filter(reviews::order_id.eq(order.id))
            .filter(reviews::user_id.eq(user_id))
            .count()
            .get_result(conn)?;
        if already > 0 {
            return Err(AppError::validation("You have already reviewed this order."));
        }

        let review: Review = diesel::insert_into(reviews::table)
            .values(&NewReview {
                id: Uuid::new_v4(),
                user_id,
                order_id: order.id,
                score,
                description,
            })
            .returning(Review::as_returning())
            .get_result(conn)?;
        Ok(review)
    })
}

/// Reviews of every order that contained the item, with the reviewer's name.
pub fn list_item_reviews(
    conn: &mut PgConnection,
    item_id: Uuid,
) -> Result<Vec<ItemReviewView>, AppError> {
    items::table
        .filter(items::id.eq(item_id))
        .select(items::id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Item not found."))?;

    let order_ids: Vec<Uuid> = order_items::table
        .filter(order_items::item_id.eq(item_id))
        .select(order_items::order_id)
        .load(conn)?;

    let rows: Vec<(Review, String, String)> = reviews::table
        .inner_join(users::table)
        .filter(reviews::order_id.eq_any(order_ids))
        .select((Review::as_select(), users::first_name, users::last_name))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(review, first_name, last_name)| ItemReviewView {
            id: review.id,
            first_name,
            last_name,
            score: review.score,
            description: review.description,
            order: review.order_id,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::*;
    use crate::models::order::{DeliveryMethod, PaymentMethod};
    use crate::services::{cart, order, score};
    use crate::test_support::{seed_customer, seed_item, seed_restaurant, setup_db};

    async fn completed_order(
        conn: &mut diesel::PgConnection,
        customer_phone: &str,
    ) -> (Uuid, Uuid, Uuid, Uuid) {
        let customer = seed_customer(conn, customer_phone);
        let (manager, restaurant) = seed_restaurant(conn, "7778889999", "Restaurant A");
        let item = seed_item(conn, restaurant.id, "10.00", 0);
        let view = cart::add_item(conn, customer.id, restaurant.id, item.id, 1).expect("add failed");
        let order_id = order::create_order(
            conn,
            customer.id,
            view.id,
            DeliveryMethod::Delivery,
            PaymentMethod::Online,
            String::new(),
        )
        .expect("create_order failed");
        order::update_status(conn, manager.id, order_id, "preparing").expect("transition failed");
        order::update_status(conn, manager.id, order_id, "completed").expect("transition failed");
        (customer.id, restaurant.id, item.id, order_id)
    }

    #[tokio::test]
    async fn review_is_unique_per_order_and_user() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let (customer_id, _, _, order_id) = completed_order(&mut conn, "1112223333").await;

        create_review(&mut conn, customer_id, order_id, 5, "Great".to_string())
            .expect("first review failed");

        let err = create_review(&mut conn, customer_id, order_id, 4, "Again".to_string())
            .expect_err("second review must be rejected");
        assert!(matches!(err, AppError::Validation(_)));

        let count: i64 = reviews::table
            .filter(reviews::order_id.eq(order_id))
            .count()
            .get_result(&mut conn)
            .expect("count failed");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn only_the_order_owner_may_review_and_only_when_completed() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let stranger = seed_customer(&mut conn, "4445556666");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);
        let view = cart::add_item(&mut conn, customer.id, restaurant.id, item.id, 1)
            .expect("add failed");
        let order_id = order::create_order(
            &mut conn,
            customer.id,
            view.id,
            DeliveryMethod::Delivery,
            PaymentMethod::Online,
            String::new(),
        )
        .expect("create_order failed");

        let err = create_review(&mut conn, stranger.id, order_id, 5, String::new())
            .expect_err("foreign order must be rejected");
        assert!(matches!(err, AppError::Validation(_)));

        // Still pending, so even the owner cannot review yet.
        let err = create_review(&mut conn, customer.id, order_id, 5, String::new())
            .expect_err("pending order must be rejected");
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_review(&mut conn, customer.id, order_id, 9, String::new())
            .expect_err("out-of-range score must be rejected");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn item_reviews_and_scores_follow_the_orders() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let (customer_id, restaurant_id, item_id, order_id) =
            completed_order(&mut conn, "1112223333").await;

        // Second customer, second completed order for the same item.
        let other = seed_customer(&mut conn, "4445556666");
        let view = cart::add_item(&mut conn, other.id, restaurant_id, item_id, 2)
            .expect("add failed");
        let second_order = order::create_order(
            &mut conn,
            other.id,
            view.id,
            DeliveryMethod::Delivery,
            PaymentMethod::Online,
            String::new(),
        )
        .expect("create_order failed");
        let manager_id: Uuid = crate::schema::restaurants::table
            .find(restaurant_id)
            .select(crate::schema::restaurants::manager_id)
            .first(&mut conn)
            .expect("manager lookup failed");
        order::update_status(&mut conn, manager_id, second_order, "preparing")
            .expect("transition failed");
        order::update_status(&mut conn, manager_id, second_order, "completed")
            .expect("transition failed");

        create_review(&mut conn, customer_id, order_id, 5, "Great".to_string())
            .expect("review failed");
        create_review(&mut conn, other.id, second_order, 3, "Okay".to_string())
            .expect("review failed");

        let listed = list_item_reviews(&mut conn, item_id).expect("list failed");
        assert_eq!(listed.len(), 2);

        assert_eq!(
            score::restaurant_score(&mut conn, restaurant_id).expect("score failed"),
            4.0
        );
        assert_eq!(
            score::item_score(&mut conn, item_id).expect("score failed"),
            4.0
        );

        let err = list_item_reviews(&mut conn, Uuid::new_v4())
            .expect_err("unknown item must 404");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
