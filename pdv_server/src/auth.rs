use std::{
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
    ValidationError,
};
use log::*;
use pdv_engine::db_types::{Merchant, MerchantId};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The custom claims carried by every merchant access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub merchant_id: MerchantId,
    pub email: String,
}

impl From<&Merchant> for JwtClaims {
    fn from(merchant: &Merchant) -> Self {
        Self { merchant_id: merchant.id.clone(), email: merchant.email.clone() }
    }
}

/// Handlers behind the JWT middleware take `JwtClaims` as an argument to learn which merchant is calling.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("🔐️ No JWT claims found in request extensions. Is the route behind the JWT middleware?");
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Hs256Key,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: config.token_lifetime }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a new access token for the given claims, valid for `duration` or the configured lifetime.
    /// This method DOES NOT check that the claims are legitimate. Authenticate the merchant first.
    pub fn issue_token(&self, claims: JwtClaims, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or(self.lifetime);
        let duration = chrono::Duration::from_std(duration).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))?;
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), duration);
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }

    /// Checks the signature and expiry of an access token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = Hs256.validator::<JwtClaims>(&self.key).validate(&untrusted).map_err(|e| {
            debug!("🔐️ Access token failed validation. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        token.claims().validate_expiration(&TimeOptions::default()).map_err(|e| match e {
            ValidationError::Expired => AuthError::TokenExpired,
            e => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(token.into_parts().1.custom)
    }
}
