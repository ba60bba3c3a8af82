use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        RwLock,
    },
};

use log::*;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::{Notification, SessionId};
use crate::db_types::{MerchantId, Order};

#[derive(Default)]
struct Registry {
    sessions: HashMap<SessionId, UnboundedSender<Notification>>,
    subscriptions: HashMap<MerchantId, HashSet<SessionId>>,
}

impl Registry {
    fn remove_from(&mut self, merchant_id: &MerchantId, session: SessionId) -> bool {
        let Some(set) = self.subscriptions.get_mut(merchant_id) else {
            return false;
        };
        let removed = set.remove(&session);
        if set.is_empty() {
            self.subscriptions.remove(merchant_id);
        }
        removed
    }
}

/// Process-local registry of live dashboard sessions, and the fan-out of notifications to them.
///
/// Every session owns an unbounded FIFO channel, so per-session delivery order matches publish order. Delivery is
/// fire-and-forget: there is no acknowledgement, retry or persistence, and a session that is not subscribed at publish
/// time never sees the event.
#[derive(Default)]
pub struct NotificationHub {
    next_session: AtomicU64,
    registry: RwLock<Registry>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session. Notifications for the merchants it subscribes to arrive on the returned receiver.
    pub fn connect(&self) -> (SessionId, UnboundedReceiver<Notification>) {
        let session = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = unbounded_channel();
        match self.registry.write() {
            Ok(mut registry) => {
                registry.sessions.insert(session, tx);
                debug!("📣️ {session} connected. {} live sessions", registry.sessions.len());
            },
            Err(e) => error!("📣️ Error getting lock on session registry: {e}"),
        }
        (session, rx)
    }

    /// Adds the session to the merchant's audience. Returns false if the session is not connected.
    pub fn subscribe(&self, session: SessionId, merchant_id: &MerchantId) -> bool {
        let mut registry = match self.registry.write() {
            Ok(r) => r,
            Err(e) => {
                error!("📣️ Error getting lock on session registry: {e}");
                return false;
            },
        };
        if !registry.sessions.contains_key(&session) {
            warn!("📣️ {session} tried to subscribe to {merchant_id}, but it is not connected");
            return false;
        }
        registry.subscriptions.entry(merchant_id.clone()).or_default().insert(session);
        debug!("📣️ {session} subscribed to {merchant_id}");
        true
    }

    /// Removes the session from the merchant's audience. The session itself stays connected.
    pub fn unsubscribe(&self, session: SessionId, merchant_id: &MerchantId) -> bool {
        match self.registry.write() {
            Ok(mut registry) => {
                let removed = registry.remove_from(merchant_id, session);
                debug!("📣️ {session} unsubscribed from {merchant_id}");
                removed
            },
            Err(e) => {
                error!("📣️ Error getting lock on session registry: {e}");
                false
            },
        }
    }

    /// Forgets the session entirely, including all of its subscriptions.
    pub fn disconnect(&self, session: SessionId) {
        match self.registry.write() {
            Ok(mut registry) => {
                registry.sessions.remove(&session);
                registry.subscriptions.retain(|_, set| {
                    set.remove(&session);
                    !set.is_empty()
                });
                debug!("📣️ {session} disconnected. {} live sessions", registry.sessions.len());
            },
            Err(e) => error!("📣️ Error getting lock on session registry: {e}"),
        }
    }

    /// Hands `notification` to every session subscribed to the merchant and returns how many there were.
    ///
    /// Sessions whose receiving end has gone away are pruned. Failures are never reported to the caller.
    pub fn publish(&self, merchant_id: &MerchantId, notification: Notification) -> usize {
        let mut dead = vec![];
        let mut delivered = 0;
        {
            let registry = match self.registry.read() {
                Ok(r) => r,
                Err(e) => {
                    error!("📣️ Error getting lock on session registry: {e}");
                    return 0;
                },
            };
            let Some(audience) = registry.subscriptions.get(merchant_id) else {
                trace!("📣️ No sessions for {merchant_id}. {} dropped", notification.notification_type);
                return 0;
            };
            for session in audience {
                match registry.sessions.get(session).map(|tx| tx.send(notification.clone())) {
                    Some(Ok(())) => delivered += 1,
                    _ => {
                        debug!("📣️ {session} is gone. It will be removed from the registry");
                        dead.push(*session);
                    },
                }
            }
        }
        for session in dead {
            self.disconnect(session);
        }
        trace!("📣️ {} {} delivered to {delivered} sessions of {merchant_id}", notification.notification_type, notification.id);
        delivered
    }

    pub fn notify_new_order(&self, merchant_id: &MerchantId, order: &Order) -> usize {
        self.publish(merchant_id, Notification::new_order(order))
    }

    pub fn notify_order_update(&self, merchant_id: &MerchantId, order: &Order) -> usize {
        self.publish(merchant_id, Notification::order_update(order))
    }

    pub fn send_notification(
        &self,
        merchant_id: &MerchantId,
        title: &str,
        message: &str,
        data: Option<serde_json::Value>,
    ) -> usize {
        self.publish(merchant_id, Notification::message(title, message, data))
    }

    pub fn subscriber_count(&self, merchant_id: &MerchantId) -> usize {
        self.registry.read().map(|r| r.subscriptions.get(merchant_id).map(|s| s.len()).unwrap_or(0)).unwrap_or(0)
    }

    pub fn session_count(&self) -> usize {
        self.registry.read().map(|r| r.sessions.len()).unwrap_or(0)
    }
}
