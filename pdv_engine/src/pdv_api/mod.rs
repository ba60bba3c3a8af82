//! The public API of the point-of-sale engine.
//!
//! Each API object wraps a storage backend `B` implementing the matching trait from [`crate::traits`], applies the
//! business rules (validation, plan limits, status transitions, timeouts), and delegates persistence to the backend.
pub mod bot_api;
pub mod catalog_api;
pub mod customer_api;
pub mod merchant_api;
pub mod order_flow_api;
pub mod order_objects;
