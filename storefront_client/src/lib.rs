//! Client for the storefront payment gateway.
//!
//! Besides a typed wrapper over the REST API ([`client::StorefrontClient`]), this crate carries the checkout
//! waiting machinery the storefront front end needs: the payment [`poller`] and the [`countdown`] timer, both
//! built as explicitly cancellable tasks rather than free-running timers.

pub mod checkout;
pub mod client;
pub mod countdown;
pub mod poller;

pub use client::StorefrontClient;
