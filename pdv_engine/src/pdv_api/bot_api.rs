use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{BotConfig, BotConfigUpdate, BotInstance, BotInstanceId, BotInstanceUpdate, BotStats, MerchantId},
    traits::{BotApiError, BotManagement},
};

/// Management of the merchant's chat bot and its conversational configuration.
pub struct BotApi<B> {
    db: B,
}

impl<B> Debug for BotApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BotApi")
    }
}

impl<B> BotApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> BotApi<B>
where B: BotManagement
{
    /// Returns the merchant's bot. A bot with the default configuration is created the first time this is called.
    pub async fn bot_for_merchant(&self, merchant_id: &MerchantId) -> Result<BotInstance, BotApiError> {
        if let Some(bot) = self.db.fetch_bot_for_merchant(merchant_id).await? {
            return Ok(bot);
        }
        let bot = self.db.insert_bot(merchant_id, BotConfig::default()).await?;
        info!("🤖️ Created bot {} for merchant {merchant_id}", bot.id);
        Ok(bot)
    }

    /// The configuration the chat front-end should run with. Fails if the merchant never set up a bot.
    pub async fn config_for_merchant(&self, merchant_id: &MerchantId) -> Result<BotConfig, BotApiError> {
        self.db
            .fetch_bot_for_merchant(merchant_id)
            .await?
            .map(|b| b.config)
            .ok_or_else(|| BotApiError::NoBotForMerchant(merchant_id.clone()))
    }

    pub async fn update_bot(
        &self,
        merchant_id: &MerchantId,
        bot_id: &BotInstanceId,
        mut update: BotInstanceUpdate,
    ) -> Result<BotInstance, BotApiError> {
        update.bot_token = update.bot_token.map(|t| t.trim().to_string());
        if update.bot_token.as_deref() == Some("") {
            return Err(BotApiError::InvalidInput("The bot token cannot be empty".into()));
        }
        let bot = self
            .db
            .update_bot(merchant_id, bot_id, update)
            .await?
            .ok_or_else(|| BotApiError::BotInstanceNotFound(bot_id.clone()))?;
        debug!("🤖️ Bot {bot_id} updated");
        Ok(bot)
    }

    pub async fn activate(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId) -> Result<BotInstance, BotApiError> {
        let update = BotInstanceUpdate { is_active: Some(true), ..Default::default() };
        let bot = self.update_bot(merchant_id, bot_id, update).await?;
        info!("🤖️ Bot {bot_id} of merchant {merchant_id} activated");
        Ok(bot)
    }

    pub async fn deactivate(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId) -> Result<BotInstance, BotApiError> {
        let update = BotInstanceUpdate { is_active: Some(false), ..Default::default() };
        let bot = self.update_bot(merchant_id, bot_id, update).await?;
        info!("🤖️ Bot {bot_id} of merchant {merchant_id} deactivated");
        Ok(bot)
    }

    pub async fn update_config(
        &self,
        merchant_id: &MerchantId,
        bot_id: &BotInstanceId,
        update: BotConfigUpdate,
    ) -> Result<BotInstance, BotApiError> {
        validate_config_update(&update)?;
        self.db
            .update_bot_config(merchant_id, bot_id, update)
            .await?
            .ok_or_else(|| BotApiError::BotInstanceNotFound(bot_id.clone()))
    }

    pub async fn stats(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId) -> Result<BotStats, BotApiError> {
        self.db.bot_stats(merchant_id, bot_id).await?.ok_or_else(|| BotApiError::BotInstanceNotFound(bot_id.clone()))
    }
}

fn validate_config_update(update: &BotConfigUpdate) -> Result<(), BotApiError> {
    if update.welcome_message.as_deref().map(|m| m.trim().is_empty()).unwrap_or(false) {
        return Err(BotApiError::InvalidInput("The welcome message cannot be empty".into()));
    }
    let slots = update.business_hours.as_ref().and_then(|h| h.schedule.as_ref());
    for slot in slots.into_iter().flatten() {
        if slot.day > 6 {
            return Err(BotApiError::InvalidInput(format!("{} is not a day of the week (0-6)", slot.day)));
        }
        if !is_clock_time(&slot.start) || !is_clock_time(&slot.end) {
            return Err(BotApiError::InvalidInput(format!(
                "Opening hours must be given as HH:MM, not {}-{}",
                slot.start, slot.end
            )));
        }
    }
    Ok(())
}

fn is_clock_time(s: &str) -> bool {
    chrono::NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}
