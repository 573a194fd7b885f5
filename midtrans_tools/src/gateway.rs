use crate::{
    ChargeRequest,
    MidtransApiError,
    MidtransNotification,
    SnapRequest,
    SnapResponse,
    TransactionStatusResponse,
};

/// The operations the payment engine needs from a payment gateway.
///
/// Transactions are addressed by the order id the gateway knows them under (`gateway_order_id`), not by the gateway
/// transaction id.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_snap_transaction(&self, request: &SnapRequest) -> Result<SnapResponse, MidtransApiError>;

    async fn charge(&self, request: &ChargeRequest) -> Result<TransactionStatusResponse, MidtransApiError>;

    async fn transaction_status(&self, gateway_order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError>;

    async fn cancel_transaction(&self, gateway_order_id: &str)
        -> Result<TransactionStatusResponse, MidtransApiError>;

    /// Checks the notification's `signature_key` against the merchant server key.
    fn verify_notification(&self, notification: &MidtransNotification) -> bool;
}
