//! # Midtrans tools
//!
//! A thin client for the parts of the Midtrans payment gateway the storefront uses:
//! * Snap transactions (hosted payment page),
//! * Core API direct charges, status queries and cancellations,
//! * HTTP notification payloads and their SHA-512 signature.
//!
//! [`PaymentGateway`] is the seam the payment engine programs against. [`MidtransApi`] is the production
//! implementation.
mod api;
mod config;
mod error;
mod gateway;

pub mod data_objects;
pub mod helpers;

pub use api::MidtransApi;
pub use config::MidtransConfig;
pub use data_objects::{
    ChargeRequest,
    CustomerDetails,
    ItemDetail,
    MidtransNotification,
    PaymentMethod,
    SnapRequest,
    SnapResponse,
    TransactionDetails,
    TransactionStatusResponse,
};
pub use error::MidtransApiError;
pub use gateway::PaymentGateway;
