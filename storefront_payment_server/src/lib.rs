//! # Storefront payment server
//! This module hosts the REST server for the storefront payment gateway. It is responsible for:
//! * Accepting checkout submissions and turning them into priced order records.
//! * Serving payment instructions and the payment-status summary the checkout page polls.
//! * Listening for incoming bank-transfer webhook notifications and reconciling them against orders.
//! * Google sign-in: verifying the credential, resolving it to a local account and issuing session tokens.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod payment_info;
pub mod routes;
pub mod server;
pub mod webhook;

#[cfg(test)]
mod endpoint_tests;
