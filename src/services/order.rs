use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cart::{Cart, CartItem};
use crate::models::customer::CustomerProfile;
use crate::models::order::{DeliveryMethod, NewOrder, NewOrderItem, Order, OrderItem, OrderState, PaymentMethod};
use crate::models::restaurant::Restaurant;
use crate::schema::{cart_items, carts, customer_profiles, items, order_items, orders, restaurants};

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub item: Uuid,
    pub name: String,
    pub discount: i32,
    pub count: i32,
    pub price: BigDecimal,
    pub photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub order_id: Uuid,
    pub restaurant: Uuid,
    pub restaurant_name: String,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub state: String,
    pub delivery_method: String,
    pub payment_method: String,
    pub description: String,
    pub latitude: Option<BigDecimal>,
    pub longitude: Option<BigDecimal>,
    pub address: Option<String>,
    pub order_items: Vec<OrderLineView>,
}

/// Delivery orders ride free; pickup orders carry the restaurant's delivery
/// surcharge.
pub fn delivery_fee(method: DeliveryMethod, restaurant_delivery_price: &BigDecimal) -> BigDecimal {
    match method {
        DeliveryMethod::Delivery => BigDecimal::from(0),
        DeliveryMethod::Pickup => restaurant_delivery_price.clone(),
    }
}

/// Materializes the caller's cart into an immutable order: freezes every
/// line verbatim, prices the delivery fee, then discards the cart. One
/// transaction, so the cart either becomes an order or stays untouched.
pub fn create_order(
    conn: &mut PgConnection,
    user_id: Uuid,
    cart_id: Uuid,
    delivery_method: DeliveryMethod,
    payment_method: PaymentMethod,
    description: String,
) -> Result<Uuid, AppError> {
    conn.transaction::<_, AppError, _>(|conn| {
        let cart: Cart = carts::table
            .filter(carts::id.eq(cart_id))
            .filter(carts::user_id.eq(user_id))
            .select(Cart::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Cart not found."))?;

        let restaurant: Restaurant = restaurants::table
            .find(cart.restaurant_id)
            .select(Restaurant::as_select())
            .first(conn)?;

        let fee = delivery_fee(delivery_method, &restaurant.delivery_price);
        let total_price = &cart.total_price + fee;

        let order_id = Uuid::new_v4();
        diesel::insert_into(orders::table)
            .values(&NewOrder {
                id: order_id,
                user_id: cart.user_id,
                restaurant_id: cart.restaurant_id,
                total_price,
                state: OrderState::Pending.as_str().to_string(),
                delivery_method: delivery_method.as_str().to_string(),
                payment_method: payment_method.as_str().to_string(),
                description,
            })
            .execute(conn)?;

        let lines: Vec<CartItem> = cart_items::table
            .filter(cart_items::cart_id.eq(cart.id))
            .select(CartItem::as_select())
            .load(conn)?;
        let frozen: Vec<NewOrderItem> = lines
            .iter()
            .map(|line| NewOrderItem {
                id: Uuid::new_v4(),
                order_id,
                item_id: line.item_id,
                count: line.count,
                price: line.price.clone(),
                discount: line.discount,
            })
            .collect();
        diesel::insert_into(order_items::table)
            .values(&frozen)
            .execute(conn)?;

        diesel::delete(carts::table.find(cart.id)).execute(conn)?;

        Ok(order_id)
    })
}

/// Manager-driven state transition. Unknown target states and moves the
/// state machine forbids are both client errors.
pub fn update_status(
    conn: &mut PgConnection,
    manager_id: Uuid,
    order_id: Uuid,
    next_state: &str,
) -> Result<(), AppError> {
    let next = OrderState::parse(next_state)
        .ok_or_else(|| AppError::validation(format!("\"{next_state}\" is not a valid choice.")))?;

    conn.transaction::<_, AppError, _>(|conn| {
        let restaurant = restaurant_for_manager(conn, manager_id)?;
        let order: Order = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::restaurant_id.eq(restaurant.id))
            .select(Order::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        let current = OrderState::parse(&order.state)
            .ok_or_else(|| AppError::Internal(format!("Corrupt order state: {}", order.state)))?;
        if !current.can_transition(next) {
            return Err(AppError::validation(format!(
                "Cannot move an order from \"{}\" to \"{}\".",
                current.as_str(),
                next.as_str()
            )));
        }

        diesel::update(orders::table.find(order.id))
            .set(orders::state.eq(next.as_str()))
            .execute(conn)?;
        Ok(())
    })
}

pub fn restaurant_for_manager(
    conn: &mut PgConnection,
    manager_id: Uuid,
) -> Result<Restaurant, AppError> {
    restaurants::table
        .filter(restaurants::manager_id.eq(manager_id))
        .select(Restaurant::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Restaurant not found."))
}

pub fn list_user_orders(
    conn: &mut PgConnection,
    user_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<OrderView>, AppError> {
    let mut query = orders::table
        .filter(orders::user_id.eq(user_id))
        .order(orders::order_date.desc())
        .select(Order::as_select())
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let rows: Vec<Order> = query.load(conn)?;
    rows.into_iter().map(|order| order_view(conn, order)).collect()
}

pub fn list_restaurant_orders(
    conn: &mut PgConnection,
    manager_id: Uuid,
) -> Result<Vec<OrderView>, AppError> {
    let restaurant = restaurant_for_manager(conn, manager_id)?;
    let rows: Vec<Order> = orders::table
        .filter(orders::restaurant_id.eq(restaurant.id))
        .order(orders::order_date.desc())
        .select(Order::as_select())
        .load(conn)?;
    rows.into_iter().map(|order| order_view(conn, order)).collect()
}

fn order_view(conn: &mut PgConnection, order: Order) -> Result<OrderView, AppError> {
    let restaurant_name: String = restaurants::table
        .find(order.restaurant_id)
        .select(restaurants::name)
        .first(conn)?;
    let profile: Option<CustomerProfile> = customer_profiles::table
        .filter(customer_profiles::user_id.eq(order.user_id))
        .select(CustomerProfile::as_select())
        .first(conn)
        .optional()?;
    let lines: Vec<(OrderItem, String, Option<String>)> = order_items::table
        .inner_join(items::table)
        .filter(order_items::order_id.eq(order.id))
        .select((OrderItem::as_select(), items::name, items::photo))
        .load(conn)?;

    let (latitude, longitude, address) = match profile {
        Some(profile) => (profile.latitude, profile.longitude, profile.address),
        None => (None, None, None),
    };

    Ok(OrderView {
        order_id: order.id,
        restaurant: order.restaurant_id,
        restaurant_name,
        order_date: order.order_date,
        total_price: order.total_price,
        state: order.state,
        delivery_method: order.delivery_method,
        payment_method: order.payment_method,
        description: order.description,
        latitude,
        longitude,
        address,
        order_items: lines
            .into_iter()
            .map(|(line, name, photo)| OrderLineView {
                id: line.id,
                item: line.item_id,
                name,
                discount: line.discount,
                count: line.count,
                price: line.price,
                photo,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;

    use super::*;
    use crate::services::cart;
    use crate::test_support::{seed_customer, seed_item, seed_restaurant, setup_db};

    #[test]
    fn pickup_pays_the_delivery_surcharge_and_delivery_does_not() {
        let surcharge = BigDecimal::from_str("5.00").expect("valid decimal");
        assert_eq!(
            delivery_fee(DeliveryMethod::Delivery, &surcharge),
            BigDecimal::from(0)
        );
        assert_eq!(delivery_fee(DeliveryMethod::Pickup, &surcharge), surcharge);
    }

    #[tokio::test]
    async fn checkout_freezes_lines_and_discards_the_cart() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);

        let view =
            cart::add_item(&mut conn, customer.id, restaurant.id, item.id, 2).expect("add failed");

        let order_id = create_order(
            &mut conn,
            customer.id,
            view.id,
            DeliveryMethod::Delivery,
            PaymentMethod::Online,
            String::new(),
        )
        .expect("create_order failed");

        // Delivery surcharge waived for delivery orders: total stays 20.00.
        let order: Order = orders::table
            .find(order_id)
            .select(Order::as_select())
            .first(&mut conn)
            .expect("order should exist");
        assert_eq!(
            order.total_price,
            BigDecimal::from_str("20.00").expect("valid decimal")
        );
        assert_eq!(order.state, "pending");

        let frozen: Vec<OrderItem> = order_items::table
            .filter(order_items::order_id.eq(order_id))
            .select(OrderItem::as_select())
            .load(&mut conn)
            .expect("lines should exist");
        assert_eq!(frozen.len(), 1);
        assert_eq!(frozen[0].count, 2);
        assert_eq!(
            frozen[0].price,
            BigDecimal::from_str("10.00").expect("valid decimal")
        );

        let leftover: i64 = carts::table
            .filter(carts::id.eq(view.id))
            .count()
            .get_result(&mut conn)
            .expect("count failed");
        assert_eq!(leftover, 0, "cart must be gone after checkout");
    }

    #[tokio::test]
    async fn pickup_checkout_adds_the_restaurant_delivery_price() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        diesel::update(restaurants::table.find(restaurant.id))
            .set(restaurants::delivery_price.eq(BigDecimal::from_str("5.00").expect("valid decimal")))
            .execute(&mut conn)
            .expect("update failed");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);

        let view =
            cart::add_item(&mut conn, customer.id, restaurant.id, item.id, 2).expect("add failed");

        let order_id = create_order(
            &mut conn,
            customer.id,
            view.id,
            DeliveryMethod::Pickup,
            PaymentMethod::InPerson,
            String::new(),
        )
        .expect("create_order failed");

        let total: BigDecimal = orders::table
            .find(order_id)
            .select(orders::total_price)
            .first(&mut conn)
            .expect("order should exist");
        assert_eq!(total, BigDecimal::from_str("25.00").expect("valid decimal"));
    }

    #[tokio::test]
    async fn foreign_cart_cannot_be_checked_out() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let alice = seed_customer(&mut conn, "1112223333");
        let mallory = seed_customer(&mut conn, "4445556666");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);

        let view =
            cart::add_item(&mut conn, alice.id, restaurant.id, item.id, 1).expect("add failed");

        let err = create_order(
            &mut conn,
            mallory.id,
            view.id,
            DeliveryMethod::Delivery,
            PaymentMethod::Online,
            String::new(),
        )
        .expect_err("foreign cart must 404");
        assert!(matches!(err, AppError::NotFound(_)));

        let still_there: i64 = carts::table
            .filter(carts::id.eq(view.id))
            .count()
            .get_result(&mut conn)
            .expect("count failed");
        assert_eq!(still_there, 1);
    }

    #[tokio::test]
    async fn status_updates_walk_the_state_machine() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (manager, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);
        let view =
            cart::add_item(&mut conn, customer.id, restaurant.id, item.id, 1).expect("add failed");
        let order_id = create_order(
            &mut conn,
            customer.id,
            view.id,
            DeliveryMethod::Delivery,
            PaymentMethod::Online,
            String::new(),
        )
        .expect("create_order failed");

        let err = update_status(&mut conn, manager.id, order_id, "shipped")
            .expect_err("unknown state must 400");
        assert!(matches!(err, AppError::Validation(_)));

        let err = update_status(&mut conn, manager.id, order_id, "completed")
            .expect_err("pending cannot jump straight to completed");
        assert!(matches!(err, AppError::Validation(_)));

        update_status(&mut conn, manager.id, order_id, "preparing").expect("transition failed");
        update_status(&mut conn, manager.id, order_id, "completed").expect("transition failed");

        let state: String = orders::table
            .find(order_id)
            .select(orders::state)
            .first(&mut conn)
            .expect("order should exist");
        assert_eq!(state, "completed");

        let err = update_status(&mut conn, manager.id, order_id, "cancelled")
            .expect_err("completed is terminal");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn managers_only_see_their_own_orders() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (manager_a, restaurant_a) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let (manager_b, _) = seed_restaurant(&mut conn, "6667778888", "Restaurant B");
        let item = seed_item(&mut conn, restaurant_a.id, "10.00", 0);
        let view =
            cart::add_item(&mut conn, customer.id, restaurant_a.id, item.id, 1).expect("add failed");
        let order_id = create_order(
            &mut conn,
            customer.id,
            view.id,
            DeliveryMethod::Delivery,
            PaymentMethod::Online,
            String::new(),
        )
        .expect("create_order failed");

        assert_eq!(
            list_restaurant_orders(&mut conn, manager_a.id)
                .expect("list failed")
                .len(),
            1
        );
        assert!(list_restaurant_orders(&mut conn, manager_b.id)
            .expect("list failed")
            .is_empty());

        let err = update_status(&mut conn, manager_b.id, order_id, "preparing")
            .expect_err("foreign manager must 404");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
