use pdv_engine::{db_types::*, notifications::Notification, NotificationHub};
use serde_json::json;

use super::helpers::{issue_token, issuer, order, MERCHANT, OTHER_MERCHANT};
use crate::notifications_ws::{handle_client_message, ServerMessage};

fn subscribe(merchant: &str, token: &str) -> String {
    json!({"event": "subscribe", "merchant_id": merchant, "token": token}).to_string()
}

#[test]
fn subscribe_then_receive_orders() {
    let _ = env_logger::try_init();
    let hub = NotificationHub::new();
    let (session, mut rx) = hub.connect();
    let token = issue_token(MERCHANT);
    let reply = handle_client_message(&subscribe(MERCHANT, &token), session, &hub, &issuer());
    assert_eq!(reply, ServerMessage::Subscribed { merchant_id: MerchantId::from(MERCHANT) });
    assert_eq!(hub.subscriber_count(&MerchantId::from(MERCHANT)), 1);

    let o = order("o-7", OrderStatusType::Pending);
    assert_eq!(hub.notify_new_order(&MerchantId::from(MERCHANT), &o), 1);
    let frame = serde_json::to_value(ServerMessage::from(rx.try_recv().unwrap())).unwrap();
    assert_eq!(frame["event"], "new_order");
    assert_eq!(frame["data"]["type"], "new_order");
    assert_eq!(frame["data"]["order_id"], "o-7");
    assert_eq!(frame["data"]["customer_name"], "Ana");
    assert_eq!(frame["data"]["total"], 1500);
    assert_eq!(frame["data"]["status"], "PENDING");
}

#[test]
fn unsubscribe_stops_delivery() {
    let _ = env_logger::try_init();
    let hub = NotificationHub::new();
    let (session, mut rx) = hub.connect();
    let token = issue_token(MERCHANT);
    handle_client_message(&subscribe(MERCHANT, &token), session, &hub, &issuer());
    let text = json!({"event": "unsubscribe", "merchant_id": MERCHANT}).to_string();
    let reply = handle_client_message(&text, session, &hub, &issuer());
    assert_eq!(reply, ServerMessage::Unsubscribed { merchant_id: MerchantId::from(MERCHANT) });
    assert_eq!(hub.notify_order_update(&MerchantId::from(MERCHANT), &order("o-7", OrderStatusType::Ready)), 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn tokens_must_match_the_merchant() {
    let _ = env_logger::try_init();
    let hub = NotificationHub::new();
    let (session, _rx) = hub.connect();
    let token = issue_token(OTHER_MERCHANT);
    let reply = handle_client_message(&subscribe(MERCHANT, &token), session, &hub, &issuer());
    assert!(matches!(reply, ServerMessage::Error { ref message } if message.contains("does not grant access")));
    assert_eq!(hub.subscriber_count(&MerchantId::from(MERCHANT)), 0);

    let reply = handle_client_message(&subscribe(MERCHANT, "not-a-token"), session, &hub, &issuer());
    assert!(matches!(reply, ServerMessage::Error { .. }));
    assert_eq!(hub.subscriber_count(&MerchantId::from(MERCHANT)), 0);
}

#[test]
fn unreadable_frames_get_an_error_reply() {
    let _ = env_logger::try_init();
    let hub = NotificationHub::new();
    let (session, _rx) = hub.connect();
    for text in ["", "{}", r#"{"event": "shout"}"#, r#"{"event": "subscribe", "merchant_id": "x"}"#] {
        let reply = handle_client_message(text, session, &hub, &issuer());
        assert!(matches!(reply, ServerMessage::Error { ref message } if message.starts_with("Invalid message")), "{text}");
    }
}

#[test]
fn disconnected_sessions_cannot_subscribe() {
    let _ = env_logger::try_init();
    let hub = NotificationHub::new();
    let (session, rx) = hub.connect();
    drop(rx);
    hub.disconnect(session);
    let token = issue_token(MERCHANT);
    let reply = handle_client_message(&subscribe(MERCHANT, &token), session, &hub, &issuer());
    assert!(matches!(reply, ServerMessage::Error { .. }));
}

#[test]
fn merchant_messages() {
    let n = Notification::message("Estoque baixo", "Coxinha com 2 unidades", Some(json!({"product_id": "p-coxinha"})));
    let frame = serde_json::to_value(ServerMessage::from(n)).unwrap();
    assert_eq!(frame["event"], "notification");
    assert_eq!(frame["data"]["title"], "Estoque baixo");
    assert_eq!(frame["data"]["data"]["product_id"], "p-coxinha");
}
