//! # Storefront payment engine public API
//!
//! The `spe_api` module exposes the programmatic API for the storefront payment engine. The API is modular, so
//! that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] is the primary API for handling the checkout and payment flows in response to storefront
//!   checkout submissions and bank transfer events.
//! * [`accounts_api`] provides the read-side order queries: order lists, order detail, the status summary the
//!   checkout page polls, and the carrier tracking report.
//! * [`auth_api`] resolves verified third-party identities to local user accounts.
//!
//! The other submodules in this module are support and utility types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use storefront_payment_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements AccountManagement
//! let api = AccountApi::new(db);
//! let summary = api.status_summary(&order_number).await?;
//! ```

pub mod accounts_api;
pub mod auth_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
