use thiserror::Error;

use crate::db_types::{BotConfig, BotConfigUpdate, BotInstance, BotInstanceId, BotInstanceUpdate, BotStats, MerchantId};

#[derive(Debug, Clone, Error)]
pub enum BotApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Bot instance {0} does not exist")]
    BotInstanceNotFound(BotInstanceId),
    #[error("Merchant {0} has no bot configured")]
    NoBotForMerchant(MerchantId),
    #[error("Invalid bot configuration. {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for BotApiError {
    fn from(e: sqlx::Error) -> Self {
        BotApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait BotManagement {
    async fn fetch_bot_for_merchant(&self, merchant_id: &MerchantId) -> Result<Option<BotInstance>, BotApiError>;

    /// Creates the merchant's bot with the given configuration. If the merchant already has a bot, the existing one is
    /// returned unchanged.
    async fn insert_bot(&self, merchant_id: &MerchantId, config: BotConfig) -> Result<BotInstance, BotApiError>;

    async fn fetch_bot(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId)
        -> Result<Option<BotInstance>, BotApiError>;

    async fn update_bot(
        &self,
        merchant_id: &MerchantId,
        bot_id: &BotInstanceId,
        update: BotInstanceUpdate,
    ) -> Result<Option<BotInstance>, BotApiError>;

    async fn update_bot_config(
        &self,
        merchant_id: &MerchantId,
        bot_id: &BotInstanceId,
        update: BotConfigUpdate,
    ) -> Result<Option<BotInstance>, BotApiError>;

    async fn bot_stats(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId) -> Result<Option<BotStats>, BotApiError>;
}
