use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{CustomerId, LineItem, MerchantId, Money, NewOrder, Order, OrderId, OrderStatusType, ProductId, Sale},
    order_objects::{NewOrderRequest, OrderPolicy, OrderQueryFilter},
    traits::{OrderFlowError, OrderManagement},
};

/// `OrderFlowApi` is the primary API for placing orders and moving them through their lifecycle.
///
/// It never sends notifications. Callers publish on the [`crate::NotificationHub`] once a call has succeeded.
pub struct OrderFlowApi<B> {
    db: B,
    policy: OrderPolicy,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.policy)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, policy: OrderPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &OrderPolicy {
        &self.policy
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Validates and places a new order for the merchant.
    ///
    /// Stock for every line item is reserved, the order is stored with status `Pending`, and a sale is appended to
    /// the ledger, all atomically. If the backend does not finish within the configured deadline, the attempt is
    /// abandoned (and rolled back) and [`OrderFlowError::Timeout`] is returned.
    pub async fn place_order(&self, merchant_id: &MerchantId, request: NewOrderRequest) -> Result<Order, OrderFlowError> {
        let order = validate_new_order(merchant_id, request)?;
        let order_id = order.id.clone();
        let deadline = self.policy.timeout;
        trace!("🔄️📦️ Placing order {order_id} for merchant {merchant_id}");
        match tokio::time::timeout(deadline, self.db.place_order(order)).await {
            Ok(Ok(order)) => {
                info!(
                    "🔄️📦️ Order {} placed for merchant {merchant_id}. {} items, {}",
                    order.id,
                    order.item_count(),
                    order.total
                );
                Ok(order)
            },
            Ok(Err(e)) => {
                debug!("🔄️📦️ Order {order_id} for merchant {merchant_id} was rejected. {e}");
                Err(e)
            },
            Err(_) => {
                warn!("🔄️📦️ Order {order_id} for merchant {merchant_id} timed out after {deadline:?} and was abandoned");
                Err(OrderFlowError::Timeout(deadline))
            },
        }
    }

    pub async fn order(&self, merchant_id: &MerchantId, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(merchant_id, order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }

    pub async fn orders(&self, merchant_id: &MerchantId, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        trace!("🔄️📦️ Fetching orders for merchant {merchant_id} [{query}]");
        self.db.search_orders(merchant_id, query).await
    }

    pub async fn orders_for_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let query = OrderQueryFilter::default().with_customer_id(customer_id.clone());
        self.db.search_orders(merchant_id, query).await
    }

    /// Moves an order to `status`.
    ///
    /// * Re-applying the current status is rejected with [`OrderFlowError::StatusUnchanged`].
    /// * With strict transitions on, only legal lifecycle moves are accepted.
    /// * With restock-on-cancel on, cancelling returns the order's quantities to stock, and cancelled orders can no
    ///   longer be reopened.
    pub async fn update_order_status(
        &self,
        merchant_id: &MerchantId,
        order_id: &OrderId,
        status: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.order(merchant_id, order_id).await?;
        let current = order.status;
        if current == status {
            return Err(OrderFlowError::StatusUnchanged(order_id.clone(), status));
        }
        if self.policy.strict_status_transitions && !current.can_transition_to(status) {
            debug!("🔄️📦️ Refusing to move order {order_id} from {current} to {status}");
            return Err(OrderFlowError::IllegalTransition { from: current, to: status });
        }
        // Cancelling already gave the stock back, so reopening would let a second cancellation give it back again
        if self.policy.restock_on_cancel && current == OrderStatusType::Canceled {
            debug!("🔄️📦️ Refusing to reopen cancelled order {order_id}. Its stock has been returned");
            return Err(OrderFlowError::IllegalTransition { from: current, to: status });
        }
        let restock = self.policy.restock_on_cancel && status == OrderStatusType::Canceled;
        let updated = self.db.update_order_status(merchant_id, order_id, current, status, restock).await?;
        info!("🔄️📦️ Order {order_id} is now {status} (was {current}){}", if restock { ". Stock returned" } else { "" });
        Ok(updated)
    }

    pub async fn sales(&self, merchant_id: &MerchantId) -> Result<Vec<Sale>, OrderFlowError> {
        self.db.fetch_sales(merchant_id).await
    }

    pub async fn sale_for_order(&self, merchant_id: &MerchantId, order_id: &OrderId) -> Result<Sale, OrderFlowError> {
        self.db
            .fetch_sale_for_order(merchant_id, order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }
}

/// Checks the shape of an order request and turns it into a [`NewOrder`] with a fresh id.
///
/// No storage is consulted. Existence of the customer and products, and stock levels, are the backend's job.
pub fn validate_new_order(merchant_id: &MerchantId, request: NewOrderRequest) -> Result<NewOrder, OrderFlowError> {
    let NewOrderRequest { customer_id, total, items, payment_method, notes } = request;
    if items.is_empty() {
        return Err(OrderFlowError::InvalidOrder("An order must contain at least one item".into()));
    }
    if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
        return Err(OrderFlowError::InvalidOrder(format!(
            "Quantity for {} must be positive, but was {}",
            item.product_id, item.quantity
        )));
    }
    if let Some(item) = items.iter().find(|i| i.price.is_negative()) {
        return Err(OrderFlowError::InvalidOrder(format!("Price for {} cannot be negative", item.product_id)));
    }
    let too_large = || OrderFlowError::InvalidOrder("The order amounts are too large".into());
    let line_totals = items.iter().map(LineItem::line_total).collect::<Option<Vec<Money>>>().ok_or_else(too_large)?;
    let computed = Money::checked_sum(line_totals).ok_or_else(too_large)?;
    let mut quantities: Vec<(&ProductId, i64)> = Vec::with_capacity(items.len());
    for item in &items {
        match quantities.iter_mut().find(|(id, _)| *id == &item.product_id) {
            Some((_, q)) => *q = q.checked_add(item.quantity).ok_or_else(too_large)?,
            None => quantities.push((&item.product_id, item.quantity)),
        }
    }
    if computed != total {
        return Err(OrderFlowError::TotalMismatch { declared: total, computed });
    }
    let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    Ok(NewOrder {
        id: OrderId::random(),
        merchant_id: merchant_id.clone(),
        customer_id,
        total,
        items,
        payment_method,
        notes,
        created_at: Utc::now(),
    })
}
