use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cart::{Cart, CartItem, NewCart, NewCartItem};
use crate::models::item::Item;
use crate::schema::{cart_items, carts, items, restaurants};

#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: Uuid,
    pub item: Uuid,
    pub name: String,
    pub discount: i32,
    pub count: i32,
    pub price: BigDecimal,
    pub photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CartView {
    pub id: Uuid,
    pub restaurant: Uuid,
    pub restaurant_name: String,
    pub total_price: BigDecimal,
    pub cart_items: Vec<CartLineView>,
}

/// Basket total: snapshot price times count per line. The stored discount is
/// informational here and does not reduce the total.
pub fn cart_total(lines: &[CartItem]) -> BigDecimal {
    lines.iter().fold(BigDecimal::from(0), |acc, line| {
        acc + &line.price * BigDecimal::from(line.count)
    })
}

fn recompute_total(conn: &mut PgConnection, cart_id: Uuid) -> Result<BigDecimal, AppError> {
    let lines: Vec<CartItem> = cart_items::table
        .filter(cart_items::cart_id.eq(cart_id))
        .select(CartItem::as_select())
        .load(conn)?;
    let total = cart_total(&lines);
    diesel::update(carts::table.find(cart_id))
        .set(carts::total_price.eq(&total))
        .execute(conn)?;
    Ok(total)
}

fn cart_view(conn: &mut PgConnection, cart_id: Uuid) -> Result<CartView, AppError> {
    let cart: Cart = carts::table
        .find(cart_id)
        .select(Cart::as_select())
        .first(conn)?;
    let restaurant_name: String = restaurants::table
        .find(cart.restaurant_id)
        .select(restaurants::name)
        .first(conn)?;
    let lines: Vec<(CartItem, String, Option<String>)> = cart_items::table
        .inner_join(items::table)
        .filter(cart_items::cart_id.eq(cart.id))
        .select((CartItem::as_select(), items::name, items::photo))
        .load(conn)?;

    Ok(CartView {
        id: cart.id,
        restaurant: cart.restaurant_id,
        restaurant_name,
        total_price: cart.total_price,
        cart_items: lines
            .into_iter()
            .map(|(line, name, photo)| CartLineView {
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

fn owned_cart(conn: &mut PgConnection, user_id: Uuid, cart_id: Uuid) -> Result<Cart, AppError> {
    carts::table
        .filter(carts::id.eq(cart_id))
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Cart not found."))
}

/// Adds `count` of an item to the caller's cart for that restaurant,
/// creating the cart and the line as needed. An existing line accumulates
/// `count` as-is and keeps its original price/discount snapshot.
pub fn add_item(
    conn: &mut PgConnection,
    user_id: Uuid,
    restaurant_id: Uuid,
    item_id: Uuid,
    count: i32,
) -> Result<CartView, AppError> {
    conn.transaction::<_, AppError, _>(|conn| {
        restaurants::table
            .filter(restaurants::id.eq(restaurant_id))
            .select(restaurants::id)
            .first::<Uuid>(conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Restaurant not found."))?;

        let item: Item = items::table
            .filter(items::id.eq(item_id))
            .filter(items::restaurant_id.eq(restaurant_id))
            .select(Item::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Item not found."))?;

        let cart = carts::table
            .filter(carts::user_id.eq(user_id))
            .filter(carts::restaurant_id.eq(restaurant_id))
            .select(Cart::as_select())
            .first(conn)
            .optional()?;
        let cart: Cart = match cart {
            Some(cart) => cart,
            None => diesel::insert_into(carts::table)
                .values(&NewCart {
                    id: Uuid::new_v4(),
                    user_id,
                    restaurant_id,
                    total_price: BigDecimal::from(0),
                })
                .returning(Cart::as_returning())
                .get_result(conn)?,
        };

        let existing: Option<CartItem> = cart_items::table
            .filter(cart_items::cart_id.eq(cart.id))
            .filter(cart_items::item_id.eq(item.id))
            .select(CartItem::as_select())
            .first(conn)
            .optional()?;
        match existing {
            Some(line) => {
                diesel::update(cart_items::table.find(line.id))
                    .set(cart_items::count.eq(line.count + count))
                    .execute(conn)?;
            }
            None => {
                diesel::insert_into(cart_items::table)
                    .values(&NewCartItem {
                        id: Uuid::new_v4(),
                        cart_id: cart.id,
                        item_id: item.id,
                        count,
                        price: item.price.clone(),
                        discount: item.discount,
                    })
                    .execute(conn)?;
            }
        }

        recompute_total(conn, cart.id)?;
        cart_view(conn, cart.id)
    })
}

/// Overwrites a line's count; zero removes the line, and removing the last
/// line removes the cart itself. Returns `None` when the cart is gone.
pub fn update_item(
    conn: &mut PgConnection,
    user_id: Uuid,
    cart_id: Uuid,
    cart_item_id: Uuid,
    new_count: i32,
) -> Result<Option<CartView>, AppError> {
    conn.transaction::<_, AppError, _>(|conn| {
        let cart = owned_cart(conn, user_id, cart_id)?;
        let line: CartItem = cart_items::table
            .filter(cart_items::id.eq(cart_item_id))
            .filter(cart_items::cart_id.eq(cart.id))
            .select(CartItem::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Cart item not found."))?;

        if new_count == 0 {
            diesel::delete(cart_items::table.find(line.id)).execute(conn)?;
            if delete_cart_if_empty(conn, cart.id)? {
                return Ok(None);
            }
        } else {
            diesel::update(cart_items::table.find(line.id))
                .set(cart_items::count.eq(new_count))
                .execute(conn)?;
        }

        recompute_total(conn, cart.id)?;
        cart_view(conn, cart.id).map(Some)
    })
}

/// Deletes one line; an emptied cart is deleted with it.
pub fn remove_item(
    conn: &mut PgConnection,
    user_id: Uuid,
    cart_id: Uuid,
    cart_item_id: Uuid,
) -> Result<(), AppError> {
    conn.transaction::<_, AppError, _>(|conn| {
        let cart = owned_cart(conn, user_id, cart_id)?;
        let line: CartItem = cart_items::table
            .filter(cart_items::id.eq(cart_item_id))
            .filter(cart_items::cart_id.eq(cart.id))
            .select(CartItem::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("Cart item not found."))?;

        diesel::delete(cart_items::table.find(line.id)).execute(conn)?;
        if !delete_cart_if_empty(conn, cart.id)? {
            recompute_total(conn, cart.id)?;
        }
        Ok(())
    })
}

fn delete_cart_if_empty(conn: &mut PgConnection, cart_id: Uuid) -> Result<bool, AppError> {
    let remaining: i64 = cart_items::table
        .filter(cart_items::cart_id.eq(cart_id))
        .count()
        .get_result(conn)?;
    if remaining == 0 {
        diesel::delete(carts::table.find(cart_id)).execute(conn)?;
        return Ok(true);
    }
    Ok(false)
}

pub fn delete_cart(conn: &mut PgConnection, user_id: Uuid, cart_id: Uuid) -> Result<(), AppError> {
    let cart = owned_cart(conn, user_id, cart_id)?;
    diesel::delete(carts::table.find(cart.id)).execute(conn)?;
    Ok(())
}

pub fn get_cart(
    conn: &mut PgConnection,
    user_id: Uuid,
    cart_id: Uuid,
) -> Result<CartView, AppError> {
    let cart = owned_cart(conn, user_id, cart_id)?;
    cart_view(conn, cart.id)
}

pub fn list_carts(
    conn: &mut PgConnection,
    user_id: Uuid,
    restaurant_id: Option<Uuid>,
) -> Result<Vec<CartView>, AppError> {
    let mut query = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .into_boxed();
    if let Some(restaurant_id) = restaurant_id {
        query = query.filter(carts::restaurant_id.eq(restaurant_id));
    }
    let rows: Vec<Cart> = query.load(conn)?;
    rows.into_iter()
        .map(|cart| cart_view(conn, cart.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::*;
    use crate::test_support::{seed_customer, seed_item, seed_restaurant, setup_db};

    #[test]
    fn total_ignores_discount_and_sums_lines() {
        let price = |s: &str| BigDecimal::from_str(s).expect("valid decimal");
        let line = |p: &str, count: i32, discount: i32| CartItem {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            count,
            price: price(p),
            discount,
        };

        assert_eq!(cart_total(&[]), BigDecimal::from(0));
        assert_eq!(
            cart_total(&[line("10.00", 2, 50), line("3.50", 1, 0)]),
            price("23.50")
        );
    }

    #[tokio::test]
    async fn repeated_adds_accumulate_count_and_keep_snapshot_price() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);

        add_item(&mut conn, customer.id, restaurant.id, item.id, 2).expect("add failed");

        // Catalog price changes must not affect lines already in the basket.
        diesel::update(items::table.find(item.id))
            .set(items::price.eq(BigDecimal::from_str("99.00").expect("valid decimal")))
            .execute(&mut conn)
            .expect("price update failed");

        let view = add_item(&mut conn, customer.id, restaurant.id, item.id, 3).expect("add failed");

        assert_eq!(view.cart_items.len(), 1);
        assert_eq!(view.cart_items[0].count, 5);
        assert_eq!(
            view.total_price,
            BigDecimal::from_str("50.00").expect("valid decimal")
        );
    }

    #[tokio::test]
    async fn negative_counts_are_accepted_verbatim() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);

        add_item(&mut conn, customer.id, restaurant.id, item.id, 5).expect("add failed");
        let view = add_item(&mut conn, customer.id, restaurant.id, item.id, -2)
            .expect("negative count is not validated");

        assert_eq!(view.cart_items[0].count, 3);
        assert_eq!(
            view.total_price,
            BigDecimal::from_str("30.00").expect("valid decimal")
        );
    }

    #[tokio::test]
    async fn add_item_rejects_unknown_restaurant_and_foreign_item() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (_, restaurant_a) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let (_, restaurant_b) = seed_restaurant(&mut conn, "6667778888", "Restaurant B");
        let item_b = seed_item(&mut conn, restaurant_b.id, "4.00", 0);

        let err = add_item(&mut conn, customer.id, Uuid::new_v4(), item_b.id, 1)
            .expect_err("unknown restaurant must 404");
        assert!(matches!(err, AppError::NotFound(_)));

        // The item exists, but belongs to another restaurant's menu.
        let err = add_item(&mut conn, customer.id, restaurant_a.id, item_b.id, 1)
            .expect_err("foreign item must 404");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_to_zero_removes_line_and_empty_cart() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);

        let view = add_item(&mut conn, customer.id, restaurant.id, item.id, 2).expect("add failed");
        let line_id = view.cart_items[0].id;

        let result = update_item(&mut conn, customer.id, view.id, line_id, 0)
            .expect("update failed");
        assert!(result.is_none(), "cart should be gone with its last line");

        let remaining: i64 = carts::table
            .filter(carts::id.eq(view.id))
            .count()
            .get_result(&mut conn)
            .expect("count failed");
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn remove_item_recomputes_total_while_lines_remain() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let customer = seed_customer(&mut conn, "1112223333");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let burger = seed_item(&mut conn, restaurant.id, "10.00", 0);
        let fries = seed_item(&mut conn, restaurant.id, "3.50", 10);

        add_item(&mut conn, customer.id, restaurant.id, burger.id, 1).expect("add failed");
        let view = add_item(&mut conn, customer.id, restaurant.id, fries.id, 2).expect("add failed");
        let burger_line = view
            .cart_items
            .iter()
            .find(|line| line.item == burger.id)
            .expect("burger line missing");

        remove_item(&mut conn, customer.id, view.id, burger_line.id).expect("remove failed");

        let after = get_cart(&mut conn, customer.id, view.id).expect("cart should remain");
        assert_eq!(after.cart_items.len(), 1);
        assert_eq!(
            after.total_price,
            BigDecimal::from_str("7.00").expect("valid decimal")
        );
    }

    #[tokio::test]
    async fn carts_of_other_users_are_invisible() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        let alice = seed_customer(&mut conn, "1112223333");
        let mallory = seed_customer(&mut conn, "4445556666");
        let (_, restaurant) = seed_restaurant(&mut conn, "7778889999", "Restaurant A");
        let item = seed_item(&mut conn, restaurant.id, "10.00", 0);

        let view = add_item(&mut conn, alice.id, restaurant.id, item.id, 1).expect("add failed");
        let line_id = view.cart_items[0].id;

        let err = update_item(&mut conn, mallory.id, view.id, line_id, 3)
            .expect_err("foreign cart must 404");
        assert!(matches!(err, AppError::NotFound(_)));
        let err =
            delete_cart(&mut conn, mallory.id, view.id).expect_err("foreign cart must 404");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
