use std::time::Duration;

use thiserror::Error;

use crate::{
    db_types::{CustomerId, MerchantId, Money, NewOrder, Order, OrderId, OrderStatusType, ProductId, Sale},
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
    #[error("The order total ({declared}) does not match the sum of its line items ({computed})")]
    TotalMismatch { declared: Money, computed: Money },
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Customer {0} does not exist")]
    CustomerNotFound(CustomerId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Insufficient stock for {name}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, name: String, requested: i64, available: i64 },
    #[error("Order {0} already has status {1}")]
    StatusUnchanged(OrderId, OrderStatusType),
    #[error("An order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} was modified by another request. Reload it and try again")]
    OrderModified(OrderId),
    #[error("The order workflow did not complete within {0:?}")]
    Timeout(Duration),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the order workflow a storage backend must provide.
///
/// Implementations are responsible for atomicity. Validation of the order *shape* (non-empty, positive quantities,
/// matching totals) is carried out by [`crate::OrderFlowApi`] before the backend is called.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Places a validated order in a single atomic operation:
    /// * verifies the customer belongs to the merchant,
    /// * decrements stock for every line item, failing if any product is unknown or short of stock,
    /// * stores the order with status `Pending`,
    /// * appends the matching sale to the ledger.
    ///
    /// If any step fails, nothing is written.
    async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;

    async fn fetch_order(&self, merchant_id: &MerchantId, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError>;

    /// Orders for the merchant matching the filter, newest first.
    async fn search_orders(
        &self,
        merchant_id: &MerchantId,
        query: OrderQueryFilter,
    ) -> Result<Vec<Order>, OrderFlowError>;

    /// Moves the order from `from` to `to`. The write only happens if the order still has status `from`.
    /// When `restock` is set, every line item's quantity is returned to stock in the same transaction.
    async fn update_order_status(
        &self,
        merchant_id: &MerchantId,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        restock: bool,
    ) -> Result<Order, OrderFlowError>;

    async fn fetch_sales(&self, merchant_id: &MerchantId) -> Result<Vec<Sale>, OrderFlowError>;

    async fn fetch_sale_for_order(
        &self,
        merchant_id: &MerchantId,
        order_id: &OrderId,
    ) -> Result<Option<Sale>, OrderFlowError>;
}
