//! Storefront Payment Engine
//!
//! The storefront payment engine carries the order placement and payment confirmation flow for the storefront:
//! checkout requests become priced order records, incoming bank transfers are reconciled against orders by their
//! payment reference, and provider logins are resolved to local user accounts. The library is provider-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`] and the SQLite backend). You should never need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is the data types used in
//!    the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@spe_api`]). This provides the public-facing functionality of the engine. It is
//!    responsible for the checkout flow, transfer reconciliation, order queries and provider-login account
//!    resolution. Backends need to implement the traits in [`mod@traits`] in order to act as a backend for the
//!    storefront payment server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine. For example, when an order's payment is confirmed, an `OrderPaidEvent` is emitted.

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod spe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use spe_api::{
    accounts_api::AccountApi,
    auth_api::{AuthApi, VerifiedIdentity},
    order_flow_api::{OrderFlowApi, PricingPolicy},
    order_objects,
    payment_objects,
};
