//! The real-time channel for merchant dashboards.
//!
//! A dashboard opens a websocket on `GET /notifications` and sends JSON text frames to choose which merchant it
//! listens to:
//!
//! ```json
//! {"event": "subscribe", "merchant_id": "…", "token": "<access token>"}
//! {"event": "unsubscribe", "merchant_id": "…"}
//! ```
//!
//! The access token must belong to the merchant being subscribed to. Order events then arrive as
//! `{"event": "new_order", "data": {…}}` frames (likewise `order_update` and `notification`). Delivery is best effort:
//! a dashboard that is not connected when an event is published never sees it.
use std::sync::Arc;

use actix_web::{get, rt, web, HttpRequest, HttpResponse};
use actix_ws::{CloseReason, Message, MessageStream, Session};
use futures::StreamExt;
use log::*;
use pdv_engine::{
    db_types::MerchantId,
    notifications::{Notification, NotificationType, SessionId},
    NotificationHub,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{auth::TokenIssuer, errors::AuthError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { merchant_id: MerchantId, token: String },
    Unsubscribe { merchant_id: MerchantId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    Subscribed { merchant_id: MerchantId },
    Unsubscribed { merchant_id: MerchantId },
    Error { message: String },
    NewOrder { data: Notification },
    OrderUpdate { data: Notification },
    Notification { data: Notification },
}

impl ServerMessage {
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::Error { message: message.into() }
    }
}

impl From<Notification> for ServerMessage {
    fn from(data: Notification) -> Self {
        match data.notification_type {
            NotificationType::NewOrder => Self::NewOrder { data },
            NotificationType::OrderUpdate => Self::OrderUpdate { data },
            NotificationType::Notification => Self::Notification { data },
        }
    }
}

/// Applies one client frame to the hub and returns the reply for the client.
pub fn handle_client_message(
    text: &str,
    session: SessionId,
    hub: &NotificationHub,
    issuer: &TokenIssuer,
) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(m) => m,
        Err(e) => {
            debug!("📣️ {session} sent an unreadable message. {e}");
            return ServerMessage::error(format!("Invalid message. {e}"));
        },
    };
    match message {
        ClientMessage::Subscribe { merchant_id, token } => {
            let claims = match issuer.validate_token(&token) {
                Ok(c) => c,
                Err(e) => return ServerMessage::error(e.to_string()),
            };
            if claims.merchant_id != merchant_id {
                warn!("📣️ {session} tried to subscribe to {merchant_id} with a token for {}", claims.merchant_id);
                return ServerMessage::error(AuthError::ForbiddenMerchant.to_string());
            }
            if hub.subscribe(session, &merchant_id) {
                ServerMessage::Subscribed { merchant_id }
            } else {
                ServerMessage::error("This session is no longer connected")
            }
        },
        ClientMessage::Unsubscribe { merchant_id } => {
            hub.unsubscribe(session, &merchant_id);
            ServerMessage::Unsubscribed { merchant_id }
        },
    }
}

#[get("/notifications")]
pub async fn notifications(
    req: HttpRequest,
    body: web::Payload,
    hub: web::Data<NotificationHub>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let (session_id, rx) = hub.connect();
    info!("📣️ Dashboard {session_id} connected from {}", req.connection_info().realip_remote_addr().unwrap_or("?"));
    rt::spawn(run_session(session_id, session, stream, rx, hub.into_inner(), issuer.into_inner()));
    Ok(response)
}

async fn run_session(
    id: SessionId,
    mut session: Session,
    mut stream: MessageStream,
    mut rx: UnboundedReceiver<Notification>,
    hub: Arc<NotificationHub>,
    issuer: Arc<TokenIssuer>,
) {
    let reason: Option<CloseReason> = loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_client_message(&text, id, &hub, &issuer);
                    if send(&mut session, &reply).await.is_err() {
                        break None;
                    }
                },
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break None;
                    }
                },
                Some(Ok(Message::Binary(_))) => {
                    let reply = ServerMessage::error("Binary frames are not supported");
                    if send(&mut session, &reply).await.is_err() {
                        break None;
                    }
                },
                Some(Ok(Message::Close(reason))) => break reason,
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    debug!("📣️ Protocol error on {id}. {e}");
                    break None;
                },
                None => break None,
            },
            notification = rx.recv() => match notification {
                Some(notification) => {
                    if send(&mut session, &ServerMessage::from(notification)).await.is_err() {
                        break None;
                    }
                },
                None => break None,
            },
        }
    };
    hub.disconnect(id);
    let _ = session.close(reason).await;
    info!("📣️ Dashboard {id} disconnected");
}

async fn send(session: &mut Session, message: &ServerMessage) -> Result<(), actix_ws::Closed> {
    match serde_json::to_string(message) {
        Ok(json) => session.text(json).await,
        Err(e) => {
            error!("📣️ Could not serialize websocket message. {e}");
            Ok(())
        },
    }
}
