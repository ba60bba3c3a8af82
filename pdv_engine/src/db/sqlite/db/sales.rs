use log::trace;
use sqlx::SqliteConnection;

use super::orders::items_to_json;
use crate::db_types::{MerchantId, NewOrder, OrderId, Sale, SaleId};

/// Appends the ledger entry for a freshly placed order. Must run in the same transaction as the order insert.
pub async fn insert_sale(order: &NewOrder, conn: &mut SqliteConnection) -> Result<SaleId, sqlx::Error> {
    let id = SaleId::random();
    let items = items_to_json(&order.items)?;
    sqlx::query(
        r#"
            INSERT INTO sales (id, merchant_id, order_id, total, items, payment_method, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7);
        "#,
    )
    .bind(&id)
    .bind(&order.merchant_id)
    .bind(&order.id)
    .bind(order.total)
    .bind(items)
    .bind(order.payment_method)
    .bind(order.created_at)
    .execute(conn)
    .await?;
    trace!("🗃️ Sale {id} recorded for order {}", order.id);
    Ok(id)
}

pub async fn fetch_sales(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<Vec<Sale>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sales WHERE merchant_id = $1 ORDER BY created_at DESC")
        .bind(merchant_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_sale_for_order(
    merchant_id: &MerchantId,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Sale>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sales WHERE order_id = $1 AND merchant_id = $2")
        .bind(order_id)
        .bind(merchant_id)
        .fetch_optional(conn)
        .await
}
