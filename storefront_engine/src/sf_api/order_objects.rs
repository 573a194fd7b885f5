use serde::{Deserialize, Serialize};
use sf_common::Rupiah;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderNumber, OrderStatusType, Payment, ShippingHistory},
    sf_api::errors::OrderFlowError,
};

/// Largest quantity of a single line item in one checkout.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;
/// Largest amount a single order may come to, shipping included and before discount.
pub const MAX_ORDER_AMOUNT: Rupiah = Rupiah::from_rupiah(10_000_000_000);

/// A checkout as submitted by the storefront. Line items arrive already priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub discount_amount: Rupiah,
    #[serde(default)]
    pub shipping_cost: Rupiah,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), OrderFlowError> {
        let invalid = |msg: &str| Err(OrderFlowError::Validation(msg.to_string()));
        if self.customer_name.trim().is_empty() {
            return invalid("customer name is required");
        }
        if !self.customer_email.contains('@') {
            return invalid("a valid customer e-mail address is required");
        }
        if self.shipping_address.trim().is_empty() {
            return invalid("shipping address is required");
        }
        if self.items.is_empty() {
            return invalid("an order needs at least one item");
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(OrderFlowError::Validation(format!("quantity for {} must be positive", item.product_name)));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity > MAX_ITEM_QUANTITY) {
            return Err(OrderFlowError::Validation(format!(
                "quantity for {} cannot exceed {MAX_ITEM_QUANTITY}",
                item.product_name
            )));
        }
        if let Some(item) = self.items.iter().find(|i| i.unit_price.is_negative()) {
            return Err(OrderFlowError::Validation(format!("price for {} cannot be negative", item.product_name)));
        }
        if self.discount_amount.is_negative() || self.shipping_cost.is_negative() {
            return invalid("discount and shipping cost cannot be negative");
        }
        let subtotal = self
            .items
            .iter()
            .try_fold(Rupiah::default(), |acc, i| i.unit_price.checked_mul(i.quantity).and_then(|t| acc.checked_add(t)));
        let within_limit = |s: &Rupiah| s.checked_add(self.shipping_cost).is_some_and(|gross| gross <= MAX_ORDER_AMOUNT);
        let Some(subtotal) = subtotal.filter(within_limit) else {
            return Err(OrderFlowError::Validation(format!("the order cannot exceed {MAX_ORDER_AMOUNT}")));
        };
        if self.discount_amount > subtotal {
            return invalid("discount cannot exceed the order subtotal");
        }
        Ok(())
    }

    pub fn into_new_order(self, order_number: OrderNumber) -> NewOrder {
        NewOrder {
            order_number,
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email.trim().to_string(),
            customer_phone: self.customer_phone.filter(|p| !p.trim().is_empty()),
            shipping_address: self.shipping_address,
            items: self.items,
            discount_amount: self.discount_amount,
            shipping_cost: self.shipping_cost,
            notes: self.notes,
        }
    }
}

/// An order with everything attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub shipping_history: Vec<ShippingHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatusType,
    /// Free text appended to the journal entry, e.g. a courier tracking number.
    #[serde(default)]
    pub note: Option<String>,
}

impl OrderStatusUpdate {
    pub fn new(status: OrderStatusType) -> Self {
        Self { status, note: None }
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }
}
