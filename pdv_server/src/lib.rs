//! # BotPDV server
//! This crate hosts the HTTP front-end of the BotPDV ordering service. It is responsible for:
//! * Authenticating merchants and issuing access tokens.
//! * Serving the merchant dashboard API (catalog, customers, orders, sales and bot settings).
//! * Serving the chat front-end API, through which customers browse products, fill carts and place orders.
//! * Pushing order events to live dashboards over a websocket.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following route groups:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth/register`, `/auth/login`: Issue access tokens.
//! * `/api/*`: Merchant routes. Require an `Authorization: Bearer <token>` header.
//! * `/bot/{merchant_id}/*`: Chat front-end routes. Require the `pdv_bot_key` header when a bot key is configured.
//! * `/notifications`: Websocket for real-time order events.

pub mod auth;
pub mod cart_worker;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod notifications_ws;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
