use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sf_common::Rupiah;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

/// Implements `Display` and `FromStr` for a fieldless enum using the same lower-case names sqlx and serde use.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $s),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok($name::$variant),)+
                    other => Err(ConversionError(format!("{} is not a valid {}", other, stringify!($name)))),
                }
            }
        }
    };
}

//--------------------------------------      OrderNumber      -------------------------------------------------------
/// The external-facing order identifier, e.g. `ORD-20240315-K7Q2ZD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: String =
            rand::thread_rng().sample_iter(&Alphanumeric).take(6).map(|c| (c as char).to_ascii_uppercase()).collect();
        Self(format!("ORD-{}-{suffix}", now.format("%Y%m%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------    OrderStatusType    -------------------------------------------------------
/// The fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

string_enum!(OrderStatusType {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl OrderStatusType {
    /// Orders only move forward through fulfilment. Cancellation is possible until the parcel has shipped.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Confirmed) |
                (Confirmed, Processing) |
                (Processing, Shipped) |
                (Shipped, Delivered) |
                (Delivered, Completed) |
                (Pending | Confirmed | Processing, Cancelled)
        )
    }

    /// The journal text recorded in the shipping history for this status.
    pub fn history_description(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "Pesanan Dibuat",
            OrderStatusType::Confirmed => "Pembayaran Dikonfirmasi",
            OrderStatusType::Processing => "Pesanan Diproses",
            OrderStatusType::Shipped => "Pesanan Dikirim",
            OrderStatusType::Delivered => "Pesanan Diterima",
            OrderStatusType::Completed => "Pesanan Selesai",
            OrderStatusType::Cancelled => "Pesanan Dibatalkan",
        }
    }
}

//--------------------------------------   OrderPaymentStatus  -------------------------------------------------------
/// The payment status as seen from the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderPaymentStatus {
    Pending,
    Paid,
    Failed,
    Expired,
    Cancelled,
    Refunded,
}

string_enum!(OrderPaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Expired => "expired",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

//--------------------------------------     PaymentStatus     -------------------------------------------------------
/// The status of a single payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Challenge,
    Cancelled,
    Refunded,
}

string_enum!(PaymentStatus {
    Pending => "pending",
    Success => "success",
    Failed => "failed",
    Challenge => "challenge",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl PaymentStatus {
    /// A live payment is still awaiting a final outcome at the gateway. An order has at most one.
    pub fn is_live(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Challenge)
    }
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub status: OrderStatusType,
    pub payment_status: OrderPaymentStatus,
    pub subtotal: Rupiah,
    pub discount_amount: Rupiah,
    pub shipping_cost: Rupiah,
    pub total_amount: Rupiah,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: Rupiah,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Rupiah {
        self.unit_price * self.quantity
    }
}

/// A checkout, ready to be stored. Totals are derived from the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub items: Vec<NewOrderItem>,
    pub discount_amount: Rupiah,
    pub shipping_cost: Rupiah,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn subtotal(&self) -> Rupiah {
        self.items.iter().map(NewOrderItem::line_total).sum()
    }

    pub fn total_amount(&self) -> Rupiah {
        self.subtotal() - self.discount_amount + self.shipping_cost
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: Rupiah,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> Rupiah {
        self.unit_price * self.quantity
    }
}

//--------------------------------------        Payment        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    /// The order id the gateway knows this payment by. Unique per attempt.
    pub gateway_order_id: String,
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
    pub status: PaymentStatus,
    pub amount: Rupiah,
    pub snap_token: Option<String>,
    pub snap_redirect_url: Option<String>,
    /// The last gateway response, verbatim.
    pub gateway_response: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub order_id: i64,
    pub gateway_order_id: String,
    pub amount: Rupiah,
    pub status: PaymentStatus,
    pub payment_type: Option<String>,
    pub transaction_id: Option<String>,
    pub snap_token: Option<String>,
    pub snap_redirect_url: Option<String>,
    pub gateway_response: Option<String>,
}

impl NewPayment {
    pub fn new(order_id: i64, gateway_order_id: String, amount: Rupiah) -> Self {
        Self {
            order_id,
            gateway_order_id,
            amount,
            status: PaymentStatus::Pending,
            payment_type: None,
            transaction_id: None,
            snap_token: None,
            snap_redirect_url: None,
            gateway_response: None,
        }
    }

    pub fn with_snap(mut self, token: String, redirect_url: String) -> Self {
        self.snap_token = Some(token);
        self.snap_redirect_url = Some(redirect_url);
        self
    }

    pub fn with_charge(mut self, payment_type: String, transaction_id: Option<String>, response: String) -> Self {
        self.payment_type = Some(payment_type);
        self.transaction_id = transaction_id;
        self.gateway_response = Some(response);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }
}

//--------------------------------------  PaymentNotification  -------------------------------------------------------
/// A gateway notification that has been applied. `(transaction_id, transaction_status, fraud_status)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub id: i64,
    pub payment_id: i64,
    pub transaction_id: String,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub status_code: String,
    pub gross_amount: String,
    pub raw_body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentNotification {
    pub payment_id: i64,
    pub transaction_id: String,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub status_code: String,
    pub gross_amount: String,
    pub raw_body: String,
}

//--------------------------------------    ShippingHistory    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShippingHistory {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatusType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Setting        -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Text,
    Password,
    Boolean,
    Image,
}

string_enum!(SettingType {
    Text => "text",
    Password => "password",
    Boolean => "boolean",
    Image => "image",
});

pub const MASKED_VALUE: &str = "********";

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    pub key: String,
    pub value: Option<String>,
    pub setting_type: SettingType,
    pub is_public: bool,
    pub group_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// A copy of the setting that is safe to show in the back office. Password values are replaced with a mask.
    pub fn masked(&self) -> Self {
        let mut result = self.clone();
        if self.setting_type == SettingType::Password && self.value.as_ref().map(|v| !v.is_empty()).unwrap_or(false) {
            result.value = Some(MASKED_VALUE.to_string());
        }
        result
    }
}
