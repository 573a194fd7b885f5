use std::fmt::Display;

use midtrans_tools::PaymentMethod;
use serde::{Deserialize, Serialize};
use storefront_engine::{
    db_types::{OrderNumber, Payment},
    traits::StatusUpdateResult,
};

/// The envelope for every successful response: `{ "success": true, "data": … }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_number: OrderNumber,
}

/// A direct charge request, e.g. `{"order_number": "ORD-…", "payment_type": "bank_transfer", "bank": "bca"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectChargeRequest {
    pub order_number: OrderNumber,
    #[serde(flatten)]
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSettingsUpdate {
    pub settings: Vec<SettingEntry>,
}

impl BulkSettingsUpdate {
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.settings.into_iter().map(|e| (e.key, e.value)).collect()
    }
}

/// The outcome of a reconciliation, as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResult {
    pub payment: Payment,
    pub order_number: OrderNumber,
    pub order_status: String,
    pub order_payment_status: String,
    pub duplicate: bool,
    pub superseded: bool,
}

impl From<StatusUpdateResult> for PaymentStatusResult {
    fn from(result: StatusUpdateResult) -> Self {
        Self {
            order_number: result.order.order_number.clone(),
            order_status: result.order.status.to_string(),
            order_payment_status: result.order.payment_status.to_string(),
            duplicate: result.duplicate,
            superseded: result.superseded,
            payment: result.payment,
        }
    }
}
