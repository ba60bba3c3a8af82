use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{BotConfig, BotConfigUpdate, BotInstance, BotInstanceId, BotInstanceUpdate, MerchantId};

const BOT_SELECT: &str = r#"
    SELECT
        bot_instances.*,
        bot_configs.welcome_message,
        bot_configs.menu_items,
        bot_configs.business_hours,
        bot_configs.auto_reply,
        bot_configs.updated_at AS config_updated_at
    FROM bot_instances JOIN bot_configs ON bot_configs.bot_instance_id = bot_instances.id
"#;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Creates a bot instance for the merchant, unless one already exists. Returns the id of the instance that was
/// created, or `None` if the merchant already had one.
pub async fn insert_bot_instance(
    merchant_id: &MerchantId,
    conn: &mut SqliteConnection,
) -> Result<Option<BotInstanceId>, sqlx::Error> {
    let id = BotInstanceId::random();
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            INSERT INTO bot_instances (id, merchant_id, is_active, created_at, updated_at)
            VALUES ($1, $2, 0, $3, $4)
            ON CONFLICT (merchant_id) DO NOTHING;
        "#,
    )
    .bind(&id)
    .bind(merchant_id)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    trace!("🗃️ Bot instance {id} created for merchant {merchant_id}");
    Ok(Some(id))
}

pub async fn insert_bot_config(
    bot_id: &BotInstanceId,
    config: &BotConfig,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO bot_configs (id, bot_instance_id, welcome_message, menu_items, business_hours, auto_reply, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7);
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(bot_id)
    .bind(&config.welcome_message)
    .bind(to_json(&config.menu_items)?)
    .bind(to_json(&config.business_hours)?)
    .bind(config.auto_reply)
    .bind(config.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_bot_for_merchant(
    merchant_id: &MerchantId,
    conn: &mut SqliteConnection,
) -> Result<Option<BotInstance>, sqlx::Error> {
    let sql = format!("{BOT_SELECT} WHERE bot_instances.merchant_id = $1");
    sqlx::query_as(&sql).bind(merchant_id).fetch_optional(conn).await
}

pub async fn fetch_bot(
    merchant_id: &MerchantId,
    bot_id: &BotInstanceId,
    conn: &mut SqliteConnection,
) -> Result<Option<BotInstance>, sqlx::Error> {
    let sql = format!("{BOT_SELECT} WHERE bot_instances.id = $1 AND bot_instances.merchant_id = $2");
    sqlx::query_as(&sql).bind(bot_id).bind(merchant_id).fetch_optional(conn).await
}

/// Returns the number of rows changed.
pub async fn update_bot_instance(
    merchant_id: &MerchantId,
    bot_id: &BotInstanceId,
    update: BotInstanceUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE bot_instances SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(token) = update.bot_token {
        builder.push(", bot_token = ").push_bind(token);
    }
    if let Some(active) = update.is_active {
        builder.push(", is_active = ").push_bind(active);
    }
    builder.push(" WHERE id = ").push_bind(bot_id.clone());
    builder.push(" AND merchant_id = ").push_bind(merchant_id.clone());
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

/// Applies the configuration update. The caller must have checked that `bot_id` belongs to the merchant.
pub async fn update_bot_config(
    bot_id: &BotInstanceId,
    update: BotConfigUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE bot_configs SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(message) = update.welcome_message {
        builder.push(", welcome_message = ").push_bind(message);
    }
    if let Some(items) = update.menu_items {
        builder.push(", menu_items = ").push_bind(to_json(&items)?);
    }
    if let Some(hours) = update.business_hours {
        builder.push(", business_hours = ").push_bind(to_json(&hours)?);
    }
    if let Some(auto_reply) = update.auto_reply {
        builder.push(", auto_reply = ").push_bind(auto_reply);
    }
    builder.push(" WHERE bot_instance_id = ").push_bind(bot_id.clone());
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}
