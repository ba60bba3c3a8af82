use std::{env, str::FromStr, time::Duration};

use log::*;
use pdv_common::{parse_boolean_flag, Secret};
use pdv_engine::{cart::DEFAULT_CART_TTL, order_objects::OrderPolicy};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_PDV_HOST: &str = "127.0.0.1";
const DEFAULT_PDV_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/pdv_store.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// How long to wait for a free database connection before giving up.
    pub acquire_timeout: Duration,
    /// Status transition and restocking rules, plus the order placement deadline.
    pub order_policy: OrderPolicy,
    /// Idle time after which a chat cart is discarded.
    pub cart_ttl: Duration,
    /// Shared key the chat front-end must send in the `pdv_bot_key` header. When `None`, the bot routes are open.
    pub bot_api_key: Option<Secret<String>>,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PDV_HOST.to_string(),
            port: DEFAULT_PDV_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            order_policy: OrderPolicy::default(),
            cart_ttl: DEFAULT_CART_TTL,
            bot_api_key: None,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PDV_HOST").ok().unwrap_or_else(|| DEFAULT_PDV_HOST.into());
        let port = env_or_default("PDV_PORT", DEFAULT_PDV_PORT);
        let database_url = env::var("PDV_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ PDV_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_connections = env_or_default("PDV_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let acquire_timeout = seconds_or_default("PDV_DB_ACQUIRE_TIMEOUT", DEFAULT_ACQUIRE_TIMEOUT);
        let defaults = OrderPolicy::default();
        let order_policy = OrderPolicy {
            strict_status_transitions: parse_boolean_flag(
                env::var("PDV_STRICT_STATUS_TRANSITIONS").ok(),
                defaults.strict_status_transitions,
            ),
            restock_on_cancel: parse_boolean_flag(env::var("PDV_RESTOCK_ON_CANCEL").ok(), defaults.restock_on_cancel),
            timeout: seconds_or_default("PDV_ORDER_TIMEOUT", defaults.timeout),
        };
        info!(
            "🪛️ Order policy: strict transitions: {}, restock on cancel: {}, deadline: {}s",
            order_policy.strict_status_transitions,
            order_policy.restock_on_cancel,
            order_policy.timeout.as_secs()
        );
        let cart_ttl = seconds_or_default("PDV_CART_TTL", DEFAULT_CART_TTL);
        let bot_api_key = env::var("PDV_BOT_API_KEY").ok().filter(|s| !s.trim().is_empty()).map(Secret::new);
        if bot_api_key.is_none() {
            warn!(
                "🚨️ PDV_BOT_API_KEY is not set. The /bot routes are open to anyone who can reach this server. Set \
                 it in production."
            );
        }
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        Self {
            host,
            port,
            database_url,
            max_connections,
            acquire_timeout,
            order_policy,
            cart_ttl,
            bot_api_key,
            auth,
        }
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

fn seconds_or_default(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_or_default(name, default.as_secs()))
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an issued access token stays valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. Every access \
             token will be invalidated when the server restarts. DO NOT operate in production like this. Set \
             PDV_JWT_SECRET instead. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("PDV_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [PDV_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "PDV_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self::new(secret))
    }
}
