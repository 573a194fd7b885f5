use serde::{Deserialize, Serialize};

use crate::db_types::{
    NewPaymentNotification,
    Order,
    OrderPaymentStatus,
    OrderStatusType,
    Payment,
    PaymentStatus,
};

/// The local effect of a gateway status: new payment status, new order payment status, and possibly a new order
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub payment_status: PaymentStatus,
    pub order_payment_status: OrderPaymentStatus,
    pub order_status: Option<OrderStatusType>,
}

impl StatusTransition {
    pub fn new(payment_status: PaymentStatus, order_payment_status: OrderPaymentStatus) -> Self {
        Self { payment_status, order_payment_status, order_status: None }
    }

    pub fn with_order_status(mut self, status: OrderStatusType) -> Self {
        self.order_status = Some(status);
        self
    }

    pub fn is_success(&self) -> bool {
        self.payment_status == PaymentStatus::Success
    }
}

/// Everything needed to apply one gateway report to a payment and its order in a single transaction.
#[derive(Debug, Clone)]
pub struct GatewayStatusUpdate {
    pub payment_id: i64,
    pub transition: StatusTransition,
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
    /// The gateway response that produced this update, stored verbatim on the payment.
    pub gateway_response: String,
    /// Present when the update comes from a notification. Used to detect redelivery.
    pub notification: Option<NewPaymentNotification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateResult {
    pub payment: Payment,
    pub order: Order,
    /// True only if this update moved the order from `pending` to `confirmed`.
    pub order_confirmed: bool,
    /// True if the notification had already been applied. Nothing was written.
    pub duplicate: bool,
    /// True if the payment had already settled (or been refunded) and the reported outcome cannot follow that. The
    /// payment and order were left untouched.
    pub superseded: bool,
}
