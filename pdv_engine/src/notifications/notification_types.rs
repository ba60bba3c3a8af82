use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db_types::{Money, Order, OrderId, OrderStatusType};

/// Display name used when the customer behind an order is unknown.
pub const DEFAULT_CUSTOMER_NAME: &str = "Cliente";

/// Identifies one live dashboard connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewOrder,
    OrderUpdate,
    Notification,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NewOrder => "new_order",
            Self::OrderUpdate => "order_update",
            Self::Notification => "notification",
        };
        f.write_str(s)
    }
}

/// What a dashboard needs to show an order in a toast or a live list, without fetching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub customer_name: String,
    pub total: Money,
    pub item_count: i64,
    pub status: OrderStatusType,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            customer_name: order
                .customer_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
            total: order.total,
            item_count: order.item_count(),
            status: order.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationBody {
    Order(OrderSummary),
    Message {
        title: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
}

/// A single real-time event. Every publish carries a fresh `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub body: NotificationBody,
}

impl Notification {
    fn new(notification_type: NotificationType, body: NotificationBody) -> Self {
        Self { id: Uuid::new_v4().to_string(), notification_type, timestamp: Utc::now(), body }
    }

    pub fn new_order(order: &Order) -> Self {
        Self::new(NotificationType::NewOrder, NotificationBody::Order(order.into()))
    }

    pub fn order_update(order: &Order) -> Self {
        Self::new(NotificationType::OrderUpdate, NotificationBody::Order(order.into()))
    }

    pub fn message<S1: Into<String>, S2: Into<String>>(title: S1, message: S2, data: Option<serde_json::Value>) -> Self {
        Self::new(NotificationType::Notification, NotificationBody::Message {
            title: title.into(),
            message: message.into(),
            data,
        })
    }
}
