//! BotPDV Engine
//!
//! The engine holds the business core of the BotPDV ordering service: a multi-tenant point-of-sale backend that takes
//! orders from chat customers and shows them live on each merchant's dashboard.
//!
//! The library is divided into these sections:
//! 1. Database management ([`mod@db`]). SQLite is the supported backend. You should never need to access the database
//!    directly; use the public APIs instead. The data types stored in the database live in [`mod@db_types`].
//! 2. The public API ([`mod@pdv_api`]). [`OrderFlowApi`] owns the atomic order placement (stock reservation, order
//!    and sale creation) and the order status lifecycle. The catalog, customer, merchant and bot APIs cover the rest
//!    of a merchant's data. Every operation is scoped to a single merchant.
//! 3. Real-time notifications ([`mod@notifications`]). A process-local hub that fans order events out to the
//!    dashboard sessions of the owning merchant.
//! 4. Chat carts ([`mod@cart`]). Short-lived, in-memory carts for customers ordering over chat.
mod db;

pub mod cart;
pub mod db_types;
pub mod helpers;
pub mod notifications;
mod pdv_api;

pub use cart::{Cart, CartError, CartStore};
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use notifications::NotificationHub;
pub use pdv_api::{
    bot_api::BotApi,
    catalog_api::CatalogApi,
    customer_api::CustomerApi,
    merchant_api::{MerchantApi, MerchantProfile, RegistrationRequest},
    order_flow_api::{validate_new_order, OrderFlowApi},
    order_objects,
};
