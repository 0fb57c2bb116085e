use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{order_items, orders};

/// Order lifecycle. Transitions are driven by the restaurant manager:
/// `pending → preparing → completed`, with `cancelled` reachable from any
/// non-terminal state. `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    Preparing,
    Completed,
    Cancelled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Preparing => "preparing",
            OrderState::Completed => "completed",
            OrderState::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<OrderState> {
        match value {
            "pending" => Some(OrderState::Pending),
            "preparing" => Some(OrderState::Preparing),
            "completed" => Some(OrderState::Completed),
            "cancelled" => Some(OrderState::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Completed | OrderState::Cancelled)
    }

    pub fn can_transition(&self, next: OrderState) -> bool {
        match (self, next) {
            (OrderState::Pending, OrderState::Preparing) => true,
            (OrderState::Preparing, OrderState::Completed) => true,
            (from, OrderState::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Delivery,
    Pickup,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Delivery => "delivery",
            DeliveryMethod::Pickup => "pickup",
        }
    }

    pub fn parse(value: &str) -> Option<DeliveryMethod> {
        match value {
            "delivery" => Some(DeliveryMethod::Delivery),
            "pickup" => Some(DeliveryMethod::Pickup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Online,
    InPerson,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::InPerson => "in_person",
        }
    }

    pub fn parse(value: &str) -> Option<PaymentMethod> {
        match value {
            "online" => Some(PaymentMethod::Online),
            "in_person" => Some(PaymentMethod::InPerson),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub state: String,
    pub delivery_method: String,
    pub payment_method: String,
    pub description: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub total_price: BigDecimal,
    pub state: String,
    pub delivery_method: String,
    pub payment_method: String,
    pub description: String,
}

/// A frozen copy of a cart line at checkout time. Never mutated afterwards.
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(Order))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub count: i32,
    pub price: BigDecimal,
    pub discount: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub count: i32,
    pub price: BigDecimal,
    pub discount: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        assert!(OrderState::Pending.can_transition(OrderState::Preparing));
        assert!(OrderState::Preparing.can_transition(OrderState::Completed));
    }

    #[test]
    fn cancel_is_reachable_from_non_terminal_states_only() {
        assert!(OrderState::Pending.can_transition(OrderState::Cancelled));
        assert!(OrderState::Preparing.can_transition(OrderState::Cancelled));
        assert!(!OrderState::Completed.can_transition(OrderState::Cancelled));
        assert!(!OrderState::Cancelled.can_transition(OrderState::Cancelled));
    }

    #[test]
    fn skipping_preparation_is_rejected() {
        assert!(!OrderState::Pending.can_transition(OrderState::Completed));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for next in [
            OrderState::Pending,
            OrderState::Preparing,
            OrderState::Completed,
            OrderState::Cancelled,
        ] {
            assert!(!OrderState::Completed.can_transition(next));
            assert!(!OrderState::Cancelled.can_transition(next));
        }
    }

    #[test]
    fn state_strings_roundtrip() {
        for state in [
            OrderState::Pending,
            OrderState::Preparing,
            OrderState::Completed,
            OrderState::Cancelled,
        ] {
            assert_eq!(OrderState::parse(state.as_str()), Some(state));
        }
        assert_eq!(OrderState::parse("invalid_state"), None);
    }
}
