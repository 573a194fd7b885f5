use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType, Payment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

/// Published once per order, when a gateway success moves it from `pending` to `confirmed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub order: Order,
    pub payment: Payment,
}

impl PaymentConfirmedEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
    pub note: Option<String>,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType, note: Option<String>) -> Self {
        Self { order, old_status, note }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    PaymentConfirmed(PaymentConfirmedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
}
