//! # Storefront engine public API
//!
//! The `sf_api` module exposes the programmatic API of the storefront engine. The API is modular, so that clients
//! can pick the parts they need.
//!
//! * [`order_flow_api`] handles checkout, order lookups and back-office order status transitions.
//! * [`payment_flow_api`] creates payments at the gateway and reconciles gateway outcomes (notifications, polled
//!   statuses, cancellations and expiry) into local order and payment state.
//! * [`settings_api`] reads and writes the settings store through an in-process cache.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs
//! (and, for payments, a [`midtrans_tools::PaymentGateway`]).
//!
//! ```rust,ignore
//! use storefront_engine::{SettingsApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = SettingsApi::new(db);
//! let settings = api.fetch_settings().await?;
//! ```

pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod settings_api;
