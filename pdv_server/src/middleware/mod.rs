mod bot_key;
mod jwt;

pub use bot_key::{BotKeyMiddlewareFactory, BotKeyMiddlewareService, BOT_KEY_HEADER};
pub use jwt::{JwtAuthMiddlewareFactory, JwtAuthMiddlewareService};
