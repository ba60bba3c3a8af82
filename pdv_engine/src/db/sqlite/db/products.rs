use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{MerchantId, NewProduct, Plan, Product, ProductId, ProductUpdate};

pub async fn insert_product(
    merchant_id: &MerchantId,
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let now = Utc::now();
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (
                id,
                merchant_id,
                name,
                description,
                price,
                stock,
                category,
                image_url,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(ProductId::random())
    .bind(merchant_id)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.category)
    .bind(product.image_url)
    .bind(product.is_active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Product {} ({}) created for merchant {merchant_id}", product.id, product.name);
    Ok(product)
}

pub async fn fetch_product(
    merchant_id: &MerchantId,
    product_id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1 AND merchant_id = $2")
        .bind(product_id)
        .bind(merchant_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_products(
    merchant_id: &MerchantId,
    active_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE merchant_id = ");
    builder.push_bind(merchant_id.clone());
    if active_only {
        builder.push(" AND is_active = 1");
    }
    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<Product>().fetch_all(conn).await
}

pub async fn count_products(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE merchant_id = $1")
        .bind(merchant_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn fetch_plan(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<Option<Plan>, sqlx::Error> {
    sqlx::query_scalar("SELECT plan FROM subscriptions WHERE merchant_id = $1")
        .bind(merchant_id)
        .fetch_optional(conn)
        .await
}

pub async fn update_product(
    merchant_id: &MerchantId,
    product_id: &ProductId,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(name) = update.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(description) = update.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(price) = update.price {
        builder.push(", price = ").push_bind(price);
    }
    if let Some(category) = update.category {
        builder.push(", category = ").push_bind(category);
    }
    if let Some(image_url) = update.image_url {
        builder.push(", image_url = ").push_bind(image_url);
    }
    if let Some(is_active) = update.is_active {
        builder.push(", is_active = ").push_bind(is_active);
    }
    builder.push(" WHERE id = ").push_bind(product_id.clone());
    builder.push(" AND merchant_id = ").push_bind(merchant_id.clone());
    builder.push(" RETURNING *");
    builder.build_query_as::<Product>().fetch_optional(conn).await
}

pub async fn delete_product(
    merchant_id: &MerchantId,
    product_id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND merchant_id = $2")
        .bind(product_id)
        .bind(merchant_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes `quantity` units from stock, but only if at least that many are available.
///
/// Returns the number of rows changed. Zero means the product does not exist for this merchant, or it does not
/// have enough stock. Callers must check this value; it is the only thing standing between two concurrent orders and
/// an oversold product.
pub async fn decrement_stock(
    merchant_id: &MerchantId,
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products SET stock = stock - $1, updated_at = $2
            WHERE id = $3 AND merchant_id = $4 AND stock >= $5
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .bind(merchant_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Returns `quantity` units to stock. Returns the number of rows changed (zero if the product no longer exists).
pub async fn increment_stock(
    merchant_id: &MerchantId,
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE products SET stock = stock + $1, updated_at = $2 WHERE id = $3 AND merchant_id = $4")
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .bind(merchant_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Adds `delta` to the stock level if the result stays non-negative. Returns `None` if nothing was changed.
pub async fn adjust_stock(
    merchant_id: &MerchantId,
    product_id: &ProductId,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE products SET stock = stock + $1, updated_at = $2
            WHERE id = $3 AND merchant_id = $4 AND stock + $5 >= 0
            RETURNING *
        "#,
    )
    .bind(delta)
    .bind(Utc::now())
    .bind(product_id)
    .bind(merchant_id)
    .bind(delta)
    .fetch_optional(conn)
    .await
}
