//! Storefront Engine
//!
//! The storefront engine holds the core logic of the apparel store backend: checkout and order fulfilment, payment
//! reconciliation against the Midtrans gateway, and the settings store. It is independent of the HTTP layer.
//!
//! The library is divided into these main sections:
//! 1. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). You should
//!    not need to access the database directly. Use the public API instead. The data types stored in the database
//!    are defined in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@sf_api`]). [`OrderFlowApi`] manages orders, [`PaymentFlowApi`] creates payments and
//!    reconciles gateway outcomes, and [`SettingsApi`] reads and writes settings through a TTL cache.
//!
//! The engine also emits events when certain things happen, for example an `OrderCreated` event when a checkout is
//! stored, or `PaymentConfirmed` when an order's payment settles. A simple actor framework ([`mod@events`]) lets you
//! hook into these events to send e-mails and the like.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod sf_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use sf_api::{
    errors::{OrderFlowError, PaymentFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_flow_api::PaymentFlowApi,
    payment_objects,
    settings_api::{SettingsApi, SettingsCache, CACHED_SETTING_KEYS, SETTINGS_CACHE_TTL},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
pub use traits::{
    GatewayStatusUpdate,
    OrderManagement,
    PaymentGatewayDatabase,
    PaymentGatewayError,
    SettingsApiError,
    SettingsManagement,
    StatusTransition,
    StatusUpdateResult,
};
