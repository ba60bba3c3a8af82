use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{CustomerId, LineItem, MerchantId, NewOrder, Order, OrderId, OrderStatusType},
    order_objects::OrderQueryFilter,
};

/// Orders are always read together with the display name of their customer.
const ORDER_SELECT: &str = r#"
    SELECT orders.*, customers.name AS customer_name
    FROM orders LEFT JOIN customers ON customers.id = orders.customer_id
"#;

pub(crate) fn items_to_json(items: &[LineItem]) -> Result<String, sqlx::Error> {
    serde_json::to_string(items).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Inserts a new order with status `Pending`. This is not atomic on its own; embed it in a transaction alongside the
/// stock decrements and the sale entry.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let items = items_to_json(&order.items)?;
    sqlx::query(
        r#"
            INSERT INTO orders (
                id,
                merchant_id,
                customer_id,
                total,
                items,
                status,
                payment_method,
                notes,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10);
        "#,
    )
    .bind(&order.id)
    .bind(&order.merchant_id)
    .bind(&order.customer_id)
    .bind(order.total)
    .bind(items)
    .bind(OrderStatusType::Pending)
    .bind(order.payment_method)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.created_at)
    .execute(conn)
    .await?;
    trace!("🗃️ Order {} inserted for merchant {}", order.id, order.merchant_id);
    Ok(())
}

pub async fn fetch_order(
    merchant_id: &MerchantId,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("{ORDER_SELECT} WHERE orders.id = $1 AND orders.merchant_id = $2");
    sqlx::query_as(&sql).bind(order_id).bind(merchant_id).fetch_optional(conn).await
}

/// Fetches the merchant's orders matching the criteria in the `OrderQueryFilter`, newest first.
pub async fn search_orders(
    merchant_id: &MerchantId,
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(ORDER_SELECT);
    builder.push(" WHERE orders.merchant_id = ").push_bind(merchant_id.clone());
    if let Some(status) = query.status {
        builder.push(" AND orders.status = ").push_bind(status);
    }
    if let Some(customer_id) = query.customer_id {
        builder.push(" AND orders.customer_id = ").push_bind(customer_id);
    }
    if let Some(since) = query.since {
        builder.push(" AND orders.created_at >= ").push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND orders.created_at <= ").push_bind(until);
    }
    builder.push(" ORDER BY orders.created_at DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Order>().fetch_all(conn).await
}

pub async fn count_orders_for_merchant(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE merchant_id = $1").bind(merchant_id).fetch_one(conn).await
}

pub async fn count_orders_for_customer(
    merchant_id: &MerchantId,
    customer_id: &CustomerId,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE merchant_id = $1 AND customer_id = $2")
        .bind(merchant_id)
        .bind(customer_id)
        .fetch_one(conn)
        .await
}

/// Sets the order status to `to`, but only if it is currently `from`. Returns the number of rows changed.
pub async fn update_order_status(
    merchant_id: &MerchantId,
    order_id: &OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET status = $1, updated_at = $2
            WHERE id = $3 AND merchant_id = $4 AND status = $5
        "#,
    )
    .bind(to)
    .bind(Utc::now())
    .bind(order_id)
    .bind(merchant_id)
    .bind(from)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
