use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Merchant, MerchantId, MerchantUpdate, NewMerchant, Subscription},
    helpers::{hash_password, verify_password},
    traits::{MerchantApiError, MerchantManagement},
};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const TRIAL_PERIOD_DAYS: i64 = 14;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub merchant: Merchant,
    pub subscription: Option<Subscription>,
}

/// Merchant sign-up, sign-in and account management.
pub struct MerchantApi<B> {
    db: B,
}

impl<B> Debug for MerchantApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MerchantApi")
    }
}

impl<B> MerchantApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MerchantApi<B>
where B: MerchantManagement
{
    /// Registers a new merchant with a trial subscription on the basic plan.
    ///
    /// E-mail addresses are compared case-insensitively.
    pub async fn register(&self, request: RegistrationRequest) -> Result<MerchantProfile, MerchantApiError> {
        let email = normalize_email(&request.email)?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(MerchantApiError::InvalidInput("A business name is required".into()));
        }
        check_password(&request.password)?;
        let password_hash = hash_password(&request.password).map_err(|e| MerchantApiError::PasswordHashError(e.to_string()))?;
        let merchant = NewMerchant { email, name, phone: request.phone, password_hash };
        let trial_ends = Utc::now() + Duration::days(TRIAL_PERIOD_DAYS);
        let (merchant, subscription) = self.db.insert_merchant(merchant, trial_ends).await?;
        info!("🔐️ New merchant registered: {} ({})", merchant.id, merchant.email);
        Ok(MerchantProfile { merchant, subscription: Some(subscription) })
    }

    /// Checks the merchant's credentials. An unknown e-mail and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<Merchant, MerchantApiError> {
        let email = email.trim().to_lowercase();
        let creds = self.db.fetch_credentials_by_email(&email).await?.ok_or_else(|| {
            debug!("🔐️ Login attempt for unknown e-mail {email}");
            MerchantApiError::InvalidCredentials
        })?;
        if !verify_password(password, &creds.password_hash) {
            debug!("🔐️ Wrong password for merchant {}", creds.id);
            return Err(MerchantApiError::InvalidCredentials);
        }
        self.db.record_login(&creds.id).await?;
        let merchant =
            self.db.fetch_merchant(&creds.id).await?.ok_or_else(|| MerchantApiError::MerchantNotFound(creds.id.clone()))?;
        debug!("🔐️ Merchant {} logged in", merchant.id);
        Ok(merchant)
    }

    pub async fn me(&self, merchant_id: &MerchantId) -> Result<MerchantProfile, MerchantApiError> {
        let merchant = self
            .db
            .fetch_merchant(merchant_id)
            .await?
            .ok_or_else(|| MerchantApiError::MerchantNotFound(merchant_id.clone()))?;
        let subscription = self.db.fetch_subscription(merchant_id).await?;
        Ok(MerchantProfile { merchant, subscription })
    }

    /// Changes the merchant's name and/or phone. Names are trimmed and may not be blank. Phones are trimmed, and a
    /// blank phone removes it.
    pub async fn update_profile(
        &self,
        merchant_id: &MerchantId,
        mut update: MerchantUpdate,
    ) -> Result<Merchant, MerchantApiError> {
        if let Some(name) = update.name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(MerchantApiError::InvalidInput("A business name is required".into()));
            }
            update.name = Some(name);
        }
        update.phone = update.phone.map(|p| p.trim().to_string());
        if update.is_empty() {
            return Ok(self.me(merchant_id).await?.merchant);
        }
        let merchant = self
            .db
            .update_profile(merchant_id, update)
            .await?
            .ok_or_else(|| MerchantApiError::MerchantNotFound(merchant_id.clone()))?;
        debug!("🔐️ Profile updated for merchant {merchant_id}");
        Ok(merchant)
    }

    pub async fn change_password(
        &self,
        merchant_id: &MerchantId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), MerchantApiError> {
        let creds = self
            .db
            .fetch_credentials(merchant_id)
            .await?
            .ok_or_else(|| MerchantApiError::MerchantNotFound(merchant_id.clone()))?;
        if !verify_password(old_password, &creds.password_hash) {
            return Err(MerchantApiError::InvalidCredentials);
        }
        check_password(new_password)?;
        let hash = hash_password(new_password).map_err(|e| MerchantApiError::PasswordHashError(e.to_string()))?;
        self.db.update_password_hash(merchant_id, &hash).await?;
        info!("🔐️ Password changed for merchant {merchant_id}");
        Ok(())
    }
}

fn normalize_email(email: &str) -> Result<String, MerchantApiError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(MerchantApiError::InvalidInput(format!("'{email}' is not a valid e-mail address"))),
    }
}

fn check_password(password: &str) -> Result<(), MerchantApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(MerchantApiError::InvalidInput(format!(
            "Passwords must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
