use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use pdv_engine::{
    db_types::*,
    order_objects::OrderPolicy,
    traits::OrderFlowError,
    BotApi,
    Cart,
    CartStore,
    CatalogApi,
    CustomerApi,
    NotificationHub,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{customer, product, send_request, stored_order, MERCHANT},
    mocks::{MockBotManager, MockCatalogManager, MockCustomerManager, MockOrderManager},
};
use crate::{
    middleware::BotKeyMiddlewareFactory,
    routes::{cart, clear_cart, remove_cart_item, AddCartItemRoute, BotConfigRoute, CheckoutRoute},
};

struct Mocks {
    orders: MockOrderManager,
    catalog: MockCatalogManager,
    customers: MockCustomerManager,
    bots: MockBotManager,
}

impl Mocks {
    fn new() -> Self {
        Self {
            orders: MockOrderManager::new(),
            catalog: MockCatalogManager::new(),
            customers: MockCustomerManager::new(),
            bots: MockBotManager::new(),
        }
    }
}

fn configure(
    mocks: Mocks,
    carts: web::Data<CartStore>,
    hub: web::Data<NotificationHub>,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(mocks.orders, OrderPolicy::default())))
            .app_data(web::Data::new(CatalogApi::new(mocks.catalog)))
            .app_data(web::Data::new(CustomerApi::new(mocks.customers)))
            .app_data(web::Data::new(BotApi::new(mocks.bots)))
            .app_data(carts)
            .app_data(hub)
            .service(
                web::scope("/bot/{merchant_id}")
                    .wrap(BotKeyMiddlewareFactory::new(None))
                    .service(cart)
                    .service(clear_cart)
                    .service(AddCartItemRoute::<MockCatalogManager>::new())
                    .service(remove_cart_item)
                    .service(CheckoutRoute::<MockOrderManager, MockCustomerManager>::new())
                    .service(BotConfigRoute::<MockBotManager>::new()),
            );
    }
}

fn merchant() -> MerchantId {
    MerchantId::from(MERCHANT)
}

fn coxinha(quantity: i64) -> LineItem {
    LineItem::new(ProductId::from("p-coxinha"), "Coxinha", Money::from(500), quantity)
}

#[actix_web::test]
async fn items_are_priced_from_the_catalog() {
    let _ = env_logger::try_init();
    let mut mocks = Mocks::new();
    mocks
        .catalog
        .expect_fetch_product()
        .withf(|m, id| m.as_str() == MERCHANT && id.as_str() == "p-coxinha")
        .times(1)
        .returning(|_, id| Ok(Some(product(id.as_str(), "Coxinha", 550, 40))));
    let carts = web::Data::new(CartStore::default());
    let config = configure(mocks, carts.clone(), web::Data::new(NotificationHub::new()));
    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/carts/5511999/items"))
        .set_json(json!({"product_id": "p-coxinha", "quantity": 2}));
    let (status, body) = send_request(req, config).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let returned_cart: Cart = serde_json::from_str(&body).unwrap();
    assert_eq!(returned_cart.items.len(), 1);
    assert_eq!(returned_cart.items[0].price, Money::from(550));
    assert_eq!(returned_cart.total(), Ok(Money::from(1100)));
    assert_eq!(carts.cart(&merchant(), "5511999").unwrap().items[0].quantity, 2);
}

#[actix_web::test]
async fn inactive_products_cannot_be_added() {
    let _ = env_logger::try_init();
    let mut mocks = Mocks::new();
    mocks.catalog.expect_fetch_product().returning(|_, id| {
        let mut p = product(id.as_str(), "Bolo", 3500, 2);
        p.is_active = false;
        Ok(Some(p))
    });
    let carts = web::Data::new(CartStore::default());
    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/carts/5511999/items"))
        .set_json(json!({"product_id": "p-bolo", "quantity": 1}));
    let (status, _) = send_request(req, configure(mocks, carts.clone(), web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(carts.is_empty());
}

#[actix_web::test]
async fn zero_quantities_are_rejected() {
    let _ = env_logger::try_init();
    let mut mocks = Mocks::new();
    mocks.catalog.expect_fetch_product().returning(|_, id| Ok(Some(product(id.as_str(), "Coxinha", 500, 40))));
    let carts = web::Data::new(CartStore::default());
    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/carts/5511999/items"))
        .set_json(json!({"product_id": "p-coxinha", "quantity": 0}));
    let (status, _) = send_request(req, configure(mocks, carts, web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn remove_and_clear() {
    let _ = env_logger::try_init();
    let carts = web::Data::new(CartStore::default());
    carts.add_item(&merchant(), "5511999", coxinha(2)).unwrap();
    let req = TestRequest::delete().uri(&format!("/bot/{MERCHANT}/carts/5511999/items/p-coxinha"));
    let (status, body) = send_request(req, configure(Mocks::new(), carts.clone(), web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::OK);
    let returned_cart: Cart = serde_json::from_str(&body).unwrap();
    assert!(returned_cart.is_empty());

    let req = TestRequest::delete().uri(&format!("/bot/{MERCHANT}/carts/5511999"));
    let (status, body) = send_request(req, configure(Mocks::new(), carts, web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already empty"), "{body}");
}

#[actix_web::test]
async fn checkout_places_the_order_and_empties_the_cart() {
    let _ = env_logger::try_init();
    let mut mocks = Mocks::new();
    mocks
        .customers
        .expect_fetch_customer_by_chat_id()
        .withf(|_, chat| chat == "5511999")
        .returning(|_, chat| Ok(Some(customer("c-ana", chat, "Ana"))));
    mocks
        .orders
        .expect_place_order()
        .withf(|o| {
            o.customer_id.as_str() == "c-ana" &&
                o.total == Money::from(1500) &&
                o.payment_method == PaymentMethod::Cash &&
                o.items.len() == 1
        })
        .times(1)
        .returning(|o| Ok(stored_order(&o, Some("Ana"), OrderStatusType::Pending)));
    let carts = web::Data::new(CartStore::default());
    carts.add_item(&merchant(), "5511999", coxinha(3)).unwrap();
    let hub = web::Data::new(NotificationHub::new());
    let (session, mut rx) = hub.connect();
    hub.subscribe(session, &merchant());

    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/carts/5511999/checkout"))
        .set_json(json!({"payment_method": "CASH", "notes": "Troco para 20"}));
    let (status, body) = send_request(req, configure(mocks, carts.clone(), hub.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.notes.as_deref(), Some("Troco para 20"));
    assert!(carts.cart(&merchant(), "5511999").unwrap().is_empty());
    assert!(rx.try_recv().is_ok());
}

#[actix_web::test]
async fn items_added_during_checkout_stay_in_the_cart() {
    let _ = env_logger::try_init();
    let carts = web::Data::new(CartStore::default());
    carts.add_item(&merchant(), "5511999", coxinha(3)).unwrap();
    let mut mocks = Mocks::new();
    mocks.customers.expect_fetch_customer_by_chat_id().returning(|_, chat| Ok(Some(customer("c-ana", chat, "Ana"))));
    let meanwhile = carts.clone();
    mocks.orders.expect_place_order().times(1).returning(move |o| {
        // The customer keeps chatting while the order is being stored
        let suco = LineItem::new(ProductId::from("p-suco"), "Suco", Money::from(700), 1);
        meanwhile.add_item(&merchant(), "5511999", suco).unwrap();
        meanwhile.add_item(&merchant(), "5511999", coxinha(1)).unwrap();
        Ok(stored_order(&o, Some("Ana"), OrderStatusType::Pending))
    });
    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/carts/5511999/checkout"))
        .set_json(json!({"payment_method": "PIX"}));
    let (status, body) = send_request(req, configure(mocks, carts.clone(), web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.items[0].quantity, 3);
    let left = carts.cart(&merchant(), "5511999").unwrap();
    assert_eq!(left.items.len(), 2);
    assert_eq!(left.items[0].product_id, ProductId::from("p-coxinha"));
    assert_eq!(left.items[0].quantity, 1);
    assert_eq!(left.items[1].product_id, ProductId::from("p-suco"));
}

#[actix_web::test]
async fn failed_checkout_keeps_the_cart() {
    let _ = env_logger::try_init();
    let mut mocks = Mocks::new();
    mocks.customers.expect_fetch_customer_by_chat_id().returning(|_, chat| Ok(Some(customer("c-ana", chat, "Ana"))));
    mocks.orders.expect_place_order().returning(|_| {
        Err(OrderFlowError::InsufficientStock {
            product_id: ProductId::from("p-coxinha"),
            name: "Coxinha".into(),
            requested: 3,
            available: 1,
        })
    });
    let carts = web::Data::new(CartStore::default());
    carts.add_item(&merchant(), "5511999", coxinha(3)).unwrap();
    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/carts/5511999/checkout"))
        .set_json(json!({"payment_method": "PIX"}));
    let (status, _) = send_request(req, configure(mocks, carts.clone(), web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(carts.cart(&merchant(), "5511999").unwrap().items.len(), 1);
}

#[actix_web::test]
async fn empty_carts_cannot_be_checked_out() {
    let _ = env_logger::try_init();
    let mut mocks = Mocks::new();
    mocks.customers.expect_fetch_customer_by_chat_id().returning(|_, chat| Ok(Some(customer("c-ana", chat, "Ana"))));
    mocks.orders.expect_place_order().never();
    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/carts/5511999/checkout"))
        .set_json(json!({"payment_method": "PIX"}));
    let carts = web::Data::new(CartStore::default());
    let (status, body) = send_request(req, configure(mocks, carts, web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("The cart is empty"), "{body}");
}

#[actix_web::test]
async fn bot_config_for_the_chat_front_end() {
    let _ = env_logger::try_init();
    let mut mocks = Mocks::new();
    mocks.bots.expect_fetch_bot_for_merchant().returning(|m| {
        let config = BotConfig { welcome_message: "Bem-vindo à Pastelaria!".into(), ..Default::default() };
        Ok(Some(BotInstance {
            id: BotInstanceId::from("b-1"),
            merchant_id: m.clone(),
            bot_token: None,
            is_active: true,
            config,
            created_at: super::helpers::timestamp(),
            updated_at: super::helpers::timestamp(),
        }))
    });
    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/config"));
    let carts = web::Data::new(CartStore::default());
    let (status, body) = send_request(req, configure(mocks, carts, web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let config: BotConfig = serde_json::from_str(&body).unwrap();
    assert_eq!(config.welcome_message, "Bem-vindo à Pastelaria!");

    let mut mocks = Mocks::new();
    mocks.bots.expect_fetch_bot_for_merchant().returning(|_| Ok(None));
    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/config"));
    let carts = web::Data::new(CartStore::default());
    let (status, _) = send_request(req, configure(mocks, carts, web::Data::new(NotificationHub::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
