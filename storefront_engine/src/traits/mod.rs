//! # Database backend contracts
//!
//! The traits in this module define the behaviour a storage backend must expose to act as the storefront engine's
//! database. [`crate::SqliteDatabase`] is the supplied implementation.
//!
//! * [`OrderManagement`] stores checkouts and their fulfilment journal.
//! * [`PaymentGatewayDatabase`] records payment attempts and applies gateway outcomes to payments and orders
//!   atomically.
//! * [`SettingsManagement`] is the key/value settings store.
mod data_objects;
mod order_management;
mod payment_gateway_database;
mod settings_management;

pub use data_objects::{GatewayStatusUpdate, StatusTransition, StatusUpdateResult};
pub use order_management::OrderManagement;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use settings_management::{SettingsApiError, SettingsManagement};
