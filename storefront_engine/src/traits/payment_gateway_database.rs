use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{NewPayment, OrderNumber, OrderStatusType, Payment, PaymentStatus},
    traits::{GatewayStatusUpdate, OrderManagement, StatusUpdateResult},
};

/// This trait defines the payment side of a storefront backend.
///
/// This behaviour includes:
/// * Recording payment attempts against orders
/// * Applying gateway outcomes (notifications and polled statuses) to payments and their orders
/// * Cancelling and expiring payment attempts
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new payment attempt.
    ///
    /// If the order already has a live (`pending` or `challenge`) payment, [`PaymentGatewayError::LivePaymentExists`]
    /// is returned. The check is enforced by the database, so concurrent requests cannot both succeed.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError>;

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, PaymentGatewayError>;

    async fn fetch_payment_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, PaymentGatewayError>;

    /// All payment attempts for the order, oldest first.
    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, PaymentGatewayError>;

    /// Applies a gateway status to the payment and its order in a single atomic transaction:
    /// * If the update carries a notification that has already been applied, nothing is written and the result is
    ///   flagged as a duplicate.
    /// * A settled payment only accepts `refunded`, and a refunded payment accepts nothing new. Any other outcome for
    ///   them is recorded as a notification but not applied, and the result is flagged as superseded.
    /// * The payment status, transaction id, payment type and raw response are updated. `paid_at` is set the first
    ///   time the payment succeeds.
    /// * The order's payment status is updated if this is the order's most recent payment, or if the payment
    ///   succeeded.
    /// * If the transition confirms the order, the order moves to `confirmed` only if it is still `pending`, and only
    ///   then is "Pembayaran Dikonfirmasi" journalled.
    async fn apply_gateway_status(&self, update: GatewayStatusUpdate)
        -> Result<StatusUpdateResult, PaymentGatewayError>;

    /// Marks a live payment as cancelled, along with the payment status of its order.
    async fn cancel_payment(&self, payment_id: i64, gateway_response: Option<String>)
        -> Result<Payment, PaymentGatewayError>;

    /// Marks payments that have been `pending` for longer than `timeout` as failed, and the payment status of their
    /// orders as expired. The expired payments are returned.
    async fn expire_stale_payments(&self, timeout: Duration) -> Result<Vec<Payment>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since order number {0} is already taken")]
    OrderAlreadyExists(OrderNumber),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("Order (internal id {0}) already has a payment awaiting completion")]
    LivePaymentExists(i64),
    #[error("A payment with gateway order id {0} already exists")]
    PaymentAlreadyExists(String),
    #[error("Order {order_id} is no longer {expected}. It was changed by another request.")]
    OrderModificationConflict { order_id: i64, expected: OrderStatusType },
    #[error("Payment {id} is {status} and can no longer be cancelled")]
    PaymentNotCancellable { id: i64, status: PaymentStatus },
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
