use midtrans_tools::MidtransApiError;
use thiserror::Error;

use crate::{
    db_types::{OrderNumber, OrderStatusType, PaymentStatus},
    traits::PaymentGatewayError,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order: {0}")]
    Validation(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Order {order_number} cannot move from {from} to {to}")]
    IllegalTransition { order_number: OrderNumber, from: OrderStatusType, to: OrderStatusType },
    #[error("{0}")]
    Database(#[from] PaymentGatewayError),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Invalid payment request: {0}")]
    Validation(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("No payment is known under gateway order id {0}")]
    UnknownGatewayOrder(String),
    #[error("The notification signature is invalid")]
    InvalidSignature,
    #[error("Order {0} already has a payment awaiting completion")]
    LivePaymentExists(OrderNumber),
    #[error("Order {order_number} cannot be paid: {reason}")]
    OrderNotPayable { order_number: OrderNumber, reason: String },
    #[error("Payment {id} is {status} and can no longer be cancelled")]
    PaymentNotCancellable { id: i64, status: PaymentStatus },
    #[error("{0}")]
    Gateway(#[from] MidtransApiError),
    #[error("{0}")]
    Database(#[from] PaymentGatewayError),
}
