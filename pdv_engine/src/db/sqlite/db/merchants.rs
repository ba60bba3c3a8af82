use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{
    Merchant,
    MerchantCredentials,
    MerchantId,
    MerchantUpdate,
    NewMerchant,
    Plan,
    Subscription,
    SubscriptionStatus,
};

pub async fn insert_merchant(merchant: NewMerchant, conn: &mut SqliteConnection) -> Result<Merchant, sqlx::Error> {
    let now = Utc::now();
    let merchant: Merchant = sqlx::query_as(
        r#"
            INSERT INTO merchants (id, email, name, phone, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(MerchantId::random())
    .bind(merchant.email)
    .bind(merchant.name)
    .bind(merchant.phone)
    .bind(merchant.password_hash)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Merchant {} created", merchant.id);
    Ok(merchant)
}

pub async fn insert_subscription(
    merchant_id: &MerchantId,
    plan: Plan,
    status: SubscriptionStatus,
    period_end: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Subscription, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO subscriptions (id, merchant_id, plan, status, current_period_end, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(merchant_id)
    .bind(plan)
    .bind(status)
    .bind(period_end)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_merchant(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<Option<Merchant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM merchants WHERE id = $1").bind(merchant_id).fetch_optional(conn).await
}

pub async fn fetch_credentials_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<MerchantCredentials>, sqlx::Error> {
    sqlx::query_as("SELECT id, password_hash FROM merchants WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub async fn fetch_credentials(
    merchant_id: &MerchantId,
    conn: &mut SqliteConnection,
) -> Result<Option<MerchantCredentials>, sqlx::Error> {
    sqlx::query_as("SELECT id, password_hash FROM merchants WHERE id = $1").bind(merchant_id).fetch_optional(conn).await
}

pub async fn fetch_subscription(
    merchant_id: &MerchantId,
    conn: &mut SqliteConnection,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM subscriptions WHERE merchant_id = $1").bind(merchant_id).fetch_optional(conn).await
}

pub async fn record_login(merchant_id: &MerchantId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE merchants SET last_login_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(merchant_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn update_profile(
    merchant_id: &MerchantId,
    update: MerchantUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Merchant>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE merchants SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(name) = update.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(phone) = update.phone {
        builder.push(", phone = ").push_bind(Some(phone).filter(|p| !p.is_empty()));
    }
    builder.push(" WHERE id = ").push_bind(merchant_id.clone());
    builder.push(" RETURNING *");
    builder.build_query_as::<Merchant>().fetch_optional(conn).await
}

pub async fn update_password_hash(
    merchant_id: &MerchantId,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query("UPDATE merchants SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(now)
        .bind(merchant_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
