//! Real-time notifications for merchant dashboards.
//!
//! The [`NotificationHub`] keeps track of connected dashboard sessions and which merchants they follow. Route handlers
//! publish to it after an order has been created or updated; the transport (a websocket in the server) drains each
//! session's receiver.
mod hub;
mod notification_types;

pub use hub::NotificationHub;
pub use notification_types::*;
