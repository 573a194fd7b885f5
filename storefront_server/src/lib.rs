//! # Storefront server
//! This crate hosts the HTTP API of the storefront backend. It is responsible for:
//! * Accepting checkouts from the storefront and serving order details.
//! * Opening Snap payments and direct charges at Midtrans, and reconciling the gateway's webhook notifications into
//!   order and payment state.
//! * Serving and updating the store settings.
//! * Sending customer e-mails when orders are created, paid or move along the fulfilment flow.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! See [routes](routes/index.html). Every route lives under `/api`, except for `/health`.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
