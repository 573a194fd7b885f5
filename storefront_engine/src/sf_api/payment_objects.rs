use midtrans_tools::TransactionStatusResponse;
use serde::{Deserialize, Serialize};

use crate::db_types::Payment;

/// A Snap payment page has been opened for the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapPayment {
    pub payment: Payment,
    pub token: String,
    pub redirect_url: String,
}

/// A direct charge was accepted. `gateway` carries the payment instructions (virtual account numbers, QR and deep
/// link actions) the customer needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResult {
    pub payment: Payment,
    pub gateway: TransactionStatusResponse,
}

/// Callback URLs handed to the gateway when creating payments.
#[derive(Debug, Clone, Default)]
pub struct PaymentOptions {
    /// Where Snap sends the customer after the payment page closes.
    pub finish_url: Option<String>,
    /// Where e-wallet apps return the customer after approving a charge.
    pub ewallet_callback_url: Option<String>,
}
