//! Request and response bodies of the Midtrans Snap and Core APIs.
//!
//! Only the fields the storefront reads are typed. Everything else the gateway sends is kept in the `extra` maps so
//! that the complete response can be stored verbatim for audit.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helpers::notification_signature;

/// Gateway item names are limited to 50 characters.
pub const MAX_ITEM_NAME_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    /// Whole rupiah. Must equal the sum of `price * quantity` over `item_details`.
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: String,
    /// Whole rupiah. Negative for discounts.
    pub price: i64,
    pub quantity: i64,
    pub name: String,
}

impl ItemDetail {
    pub fn new<S: Into<String>>(id: S, price: i64, quantity: i64, name: &str) -> Self {
        let name = name.chars().take(MAX_ITEM_NAME_LENGTH).collect();
        Self { id: id.into(), price, quantity, name }
    }

    pub fn line_total(&self) -> i64 {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapCallbacks {
    pub finish: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapRequest {
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ItemDetail>,
    pub customer_details: CustomerDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<SnapCallbacks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapResponse {
    pub token: String,
    pub redirect_url: String,
}

//--------------------------------------     Direct charge   ---------------------------------------------------------

/// The Core API payment channels the storefront offers for direct charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "payment_type", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Virtual account transfer. `bank` is the gateway bank code, e.g. `bca`, `bni`, `bri`, `permata`.
    BankTransfer { bank: String },
    /// Mandiri bill payment.
    Echannel,
    Gopay,
    Shopeepay,
    Qris,
}

impl PaymentMethod {
    pub fn payment_type(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer { .. } => "bank_transfer",
            PaymentMethod::Echannel => "echannel",
            PaymentMethod::Gopay => "gopay",
            PaymentMethod::Shopeepay => "shopeepay",
            PaymentMethod::Qris => "qris",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::BankTransfer { bank } => write!(f, "bank_transfer ({bank})"),
            _ => write!(f, "{}", self.payment_type()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransferDetails {
    pub bank: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchannelDetails {
    pub bill_info1: String,
    pub bill_info2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EwalletDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_callback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrisDetails {
    pub acquirer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub payment_type: String,
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ItemDetail>,
    pub customer_details: CustomerDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_transfer: Option<BankTransferDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echannel: Option<EchannelDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gopay: Option<EwalletDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopeepay: Option<EwalletDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qris: Option<QrisDetails>,
}

impl ChargeRequest {
    pub fn new(
        method: &PaymentMethod,
        transaction_details: TransactionDetails,
        item_details: Vec<ItemDetail>,
        customer_details: CustomerDetails,
        callback_url: Option<String>,
    ) -> Self {
        let mut request = Self {
            payment_type: method.payment_type().to_string(),
            transaction_details,
            item_details,
            customer_details,
            bank_transfer: None,
            echannel: None,
            gopay: None,
            shopeepay: None,
            qris: None,
        };
        match method {
            PaymentMethod::BankTransfer { bank } => {
                request.bank_transfer = Some(BankTransferDetails { bank: bank.to_lowercase() })
            },
            PaymentMethod::Echannel => {
                request.echannel =
                    Some(EchannelDetails { bill_info1: "Payment:".into(), bill_info2: "Online purchase".into() })
            },
            PaymentMethod::Gopay => {
                request.gopay = Some(EwalletDetails { enable_callback: Some(callback_url.is_some()), callback_url })
            },
            PaymentMethod::Shopeepay => {
                request.shopeepay = Some(EwalletDetails { enable_callback: None, callback_url })
            },
            PaymentMethod::Qris => request.qris = Some(QrisDetails { acquirer: "gopay".into() }),
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaNumber {
    pub bank: String,
    pub va_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAction {
    pub name: String,
    pub method: String,
    pub url: String,
}

/// The Core API answers charge, status and cancel calls with the same shape. `status_code` inside the body is the
/// real result; the HTTP status is usually 200 regardless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub status_code: String,
    #[serde(default)]
    pub status_message: String,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub gross_amount: Option<String>,
    pub payment_type: Option<String>,
    pub transaction_time: Option<String>,
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub va_numbers: Vec<VaNumber>,
    pub permata_va_number: Option<String>,
    pub bill_key: Option<String>,
    pub biller_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<GatewayAction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionStatusResponse {
    /// 200 and 201 are success and pending. 407 is returned for expired transactions, which still carry a valid
    /// status.
    pub fn is_ok(&self) -> bool {
        matches!(self.status_code.as_str(), "200" | "201" | "407")
    }
}

//--------------------------------------     Notification    ---------------------------------------------------------

/// The HTTP notification (webhook) body the gateway POSTs on every transaction state change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MidtransNotification {
    pub transaction_status: String,
    pub transaction_id: String,
    pub order_id: String,
    pub status_code: String,
    /// Kept as the gateway's string (e.g. `10000.00`); it is part of the signature and must not be re-formatted.
    pub gross_amount: String,
    pub signature_key: String,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
    pub status_message: Option<String>,
    pub transaction_time: Option<String>,
    pub settlement_time: Option<String>,
    pub merchant_id: Option<String>,
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MidtransNotification {
    pub fn expected_signature(&self, server_key: &str) -> String {
        notification_signature(&self.order_id, &self.status_code, &self.gross_amount, server_key)
    }

    /// Signatures are lower-case hex and compared exactly.
    pub fn is_signed_with(&self, server_key: &str) -> bool {
        !self.signature_key.is_empty() && self.signature_key == self.expected_signature(server_key)
    }
}

impl From<&MidtransNotification> for TransactionStatusResponse {
    fn from(n: &MidtransNotification) -> Self {
        Self {
            status_code: n.status_code.clone(),
            status_message: n.status_message.clone().unwrap_or_default(),
            transaction_id: Some(n.transaction_id.clone()),
            order_id: Some(n.order_id.clone()),
            gross_amount: Some(n.gross_amount.clone()),
            payment_type: n.payment_type.clone(),
            transaction_time: n.transaction_time.clone(),
            transaction_status: Some(n.transaction_status.clone()),
            fraud_status: n.fraud_status.clone(),
            ..Default::default()
        }
    }
}
