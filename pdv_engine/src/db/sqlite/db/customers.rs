use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{Customer, CustomerId, CustomerUpdate, MerchantId, NewCustomer};

pub async fn insert_customer(
    merchant_id: &MerchantId,
    customer: NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<Customer, sqlx::Error> {
    let now = Utc::now();
    let customer: Customer = sqlx::query_as(
        r#"
            INSERT INTO customers (id, merchant_id, chat_id, name, phone, address, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(CustomerId::random())
    .bind(merchant_id)
    .bind(customer.chat_id)
    .bind(customer.name)
    .bind(customer.phone)
    .bind(customer.address)
    .bind(customer.notes)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Customer {} created for merchant {merchant_id}", customer.id);
    Ok(customer)
}

/// Inserts the customer unless the merchant already has one with the same chat id. Returns `true` if a row was
/// inserted.
pub async fn insert_customer_if_new_chat(
    merchant_id: &MerchantId,
    customer: NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            INSERT INTO customers (id, merchant_id, chat_id, name, phone, address, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (merchant_id, chat_id) DO NOTHING;
        "#,
    )
    .bind(CustomerId::random())
    .bind(merchant_id)
    .bind(customer.chat_id)
    .bind(customer.name)
    .bind(customer.phone)
    .bind(customer.address)
    .bind(customer.notes)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_customer(
    merchant_id: &MerchantId,
    customer_id: &CustomerId,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE id = $1 AND merchant_id = $2")
        .bind(customer_id)
        .bind(merchant_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_customer_by_chat_id(
    merchant_id: &MerchantId,
    chat_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE chat_id = $1 AND merchant_id = $2")
        .bind(chat_id)
        .bind(merchant_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_customers(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE merchant_id = $1 ORDER BY created_at DESC")
        .bind(merchant_id)
        .fetch_all(conn)
        .await
}

pub async fn count_customers(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE merchant_id = $1").bind(merchant_id).fetch_one(conn).await
}

pub async fn update_customer(
    merchant_id: &MerchantId,
    customer_id: &CustomerId,
    update: CustomerUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE customers SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(name) = update.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(phone) = update.phone {
        builder.push(", phone = ").push_bind(phone);
    }
    if let Some(address) = update.address {
        builder.push(", address = ").push_bind(address);
    }
    if let Some(notes) = update.notes {
        builder.push(", notes = ").push_bind(notes);
    }
    builder.push(" WHERE id = ").push_bind(customer_id.clone());
    builder.push(" AND merchant_id = ").push_bind(merchant_id.clone());
    builder.push(" RETURNING *");
    builder.build_query_as::<Customer>().fetch_optional(conn).await
}

pub async fn delete_customer(
    merchant_id: &MerchantId,
    customer_id: &CustomerId,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND merchant_id = $2")
        .bind(customer_id)
        .bind(merchant_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
