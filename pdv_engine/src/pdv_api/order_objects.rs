use std::{fmt::Display, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{CustomerId, LineItem, Money, OrderStatusType, PaymentMethod};

pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(10);

/// An order as submitted by a client, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub customer_id: CustomerId,
    /// The total the client believes it is paying. Must equal the sum of the line items.
    pub total: Money,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
}

/// Knobs for the order workflow.
#[derive(Debug, Clone, Copy)]
pub struct OrderPolicy {
    /// When set, only forward moves along the order lifecycle (and cancellation of open orders) are allowed.
    pub strict_status_transitions: bool,
    /// When set, cancelling an order returns its quantities to stock.
    pub restock_on_cancel: bool,
    /// Deadline for the whole order placement workflow.
    pub timeout: Duration,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self { strict_status_transitions: true, restock_on_cancel: false, timeout: DEFAULT_ORDER_TIMEOUT }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub status: Option<OrderStatusType>,
    pub customer_id: Option<CustomerId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_customer_id(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() &&
            self.customer_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.limit.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "All orders");
        }
        let mut parts = vec![];
        if let Some(status) = &self.status {
            parts.push(format!("status: {status}"));
        }
        if let Some(cid) = &self.customer_id {
            parts.push(format!("customer_id: {cid}"));
        }
        if let Some(since) = &self.since {
            parts.push(format!("since: {since}"));
        }
        if let Some(until) = &self.until {
            parts.push(format!("until: {until}"));
        }
        if let Some(limit) = &self.limit {
            parts.push(format!("limit: {limit}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}
