//! # Backend contracts
//!
//! This module defines the behaviour a storage backend must expose in order to serve the point-of-sale engine.
//! Every method that touches tenant data takes the [`MerchantId`](crate::db_types::MerchantId) explicitly, and
//! backends MUST filter on it. A row owned by another merchant is indistinguishable from a missing row.
//!
//! * [`OrderManagement`] is the heart of the engine. It owns the atomic order placement and status transitions.
//! * [`CatalogManagement`] manages products and their stock.
//! * [`CustomerManagement`] manages each merchant's customer book.
//! * [`MerchantManagement`] manages merchant accounts, credentials and subscriptions.
//! * [`BotManagement`] manages the chat bot instance and its configuration.
mod bot_management;
mod catalog_management;
mod customer_management;
mod merchant_management;
mod order_management;

pub use bot_management::{BotApiError, BotManagement};
pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use customer_management::{CustomerApiError, CustomerManagement};
pub use merchant_management::{MerchantApiError, MerchantManagement};
pub use order_management::{OrderFlowError, OrderManagement};
