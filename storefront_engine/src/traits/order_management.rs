use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderNumber, OrderStatusType, ShippingHistory},
    traits::PaymentGatewayError,
};

/// Storage of orders, their line items and their fulfilment journal.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores the order and its items, and journals the initial `pending` status, in one transaction.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, PaymentGatewayError>;

    /// The shipping history for the order, oldest first.
    async fn fetch_shipping_history(&self, order_id: i64) -> Result<Vec<ShippingHistory>, PaymentGatewayError>;

    /// Moves the order from `from` to `to` and journals the change.
    ///
    /// The update is conditional on the order still being in `from`; if another request got there first,
    /// [`PaymentGatewayError::OrderModificationConflict`] is returned and nothing is written.
    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
        description: &str,
    ) -> Result<Order, PaymentGatewayError>;
}
