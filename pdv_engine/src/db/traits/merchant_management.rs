use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Merchant, MerchantCredentials, MerchantId, MerchantUpdate, NewMerchant, Subscription};

#[derive(Debug, Clone, Error)]
pub enum MerchantApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The e-mail address {0} is already registered")]
    EmailAlreadyRegistered(String),
    #[error("Invalid e-mail or password")]
    InvalidCredentials,
    #[error("Merchant {0} does not exist")]
    MerchantNotFound(MerchantId),
    #[error("Invalid account data. {0}")]
    InvalidInput(String),
    #[error("Could not hash password. {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for MerchantApiError {
    fn from(e: sqlx::Error) -> Self {
        MerchantApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait MerchantManagement {
    /// Creates the merchant together with a trial subscription ending at `trial_ends`, atomically.
    async fn insert_merchant(
        &self,
        merchant: NewMerchant,
        trial_ends: DateTime<Utc>,
    ) -> Result<(Merchant, Subscription), MerchantApiError>;

    async fn fetch_merchant(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>, MerchantApiError>;

    async fn fetch_credentials_by_email(&self, email: &str) -> Result<Option<MerchantCredentials>, MerchantApiError>;

    async fn fetch_credentials(&self, merchant_id: &MerchantId)
        -> Result<Option<MerchantCredentials>, MerchantApiError>;

    async fn fetch_subscription(&self, merchant_id: &MerchantId) -> Result<Option<Subscription>, MerchantApiError>;

    async fn record_login(&self, merchant_id: &MerchantId) -> Result<(), MerchantApiError>;

    /// Applies the profile changes and returns the updated merchant, or `None` if there is no such merchant.
    async fn update_profile(
        &self,
        merchant_id: &MerchantId,
        update: MerchantUpdate,
    ) -> Result<Option<Merchant>, MerchantApiError>;

    async fn update_password_hash(&self, merchant_id: &MerchantId, password_hash: &str)
        -> Result<(), MerchantApiError>;
}
