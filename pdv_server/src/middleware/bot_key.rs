//! Shared-key middleware for the chat front-end routes.
//!
//! The chat bot process calls the `/bot/{merchant_id}` routes on behalf of customers. It proves who it is by sending
//! the configured `PDV_BOT_API_KEY` in the `pdv_bot_key` header. When no key is configured the check is disabled.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use pdv_common::Secret;

use crate::errors::{AuthError, ServerError};

pub const BOT_KEY_HEADER: &str = "pdv_bot_key";

pub struct BotKeyMiddlewareFactory {
    key: Option<Secret<String>>,
}

impl BotKeyMiddlewareFactory {
    pub fn new(key: Option<Secret<String>>) -> Self {
        BotKeyMiddlewareFactory { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BotKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = BotKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BotKeyMiddlewareService { key: self.key.clone(), service: Rc::new(service) }))
    }
}

pub struct BotKeyMiddlewareService<S> {
    key: Option<Secret<String>>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BotKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let accepted = match &self.key {
            None => true,
            Some(key) => req
                .headers()
                .get(BOT_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| constant_time_eq(v.as_bytes(), key.reveal().as_bytes()))
                .unwrap_or(false),
        };
        Box::pin(async move {
            if accepted {
                trace!("🔐️ Bot key check for {} ✅️", req.path());
                service.call(req).await
            } else {
                warn!("🔐️ Missing or invalid bot key on request to {}. Denying access.", req.path());
                Err(ServerError::AuthenticationError(AuthError::InvalidBotKey).into())
            }
        })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
