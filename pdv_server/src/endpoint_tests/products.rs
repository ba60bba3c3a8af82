use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use pdv_common::Secret;
use pdv_engine::{
    db_types::*,
    traits::{CatalogApiError, CustomerApiError},
    CatalogApi,
    CustomerApi,
};
use serde_json::json;

use super::{
    helpers::{bearer, customer, issue_token, product, send_request, MERCHANT},
    mocks::{MockCatalogManager, MockCustomerManager},
};
use crate::{
    middleware::{BotKeyMiddlewareFactory, JwtAuthMiddlewareFactory, BOT_KEY_HEADER},
    routes::{
        AdjustStockRoute,
        BotFindOrCreateCustomerRoute,
        BotProductByIdRoute,
        BotProductsRoute,
        CreateProductRoute,
        DeleteCustomerRoute,
        ProductsRoute,
    },
};

const BOT_KEY: &str = "chave-do-bot";

fn configure(
    catalog: MockCatalogManager,
    customers: MockCustomerManager,
    bot_key: Option<&str>,
) -> impl FnOnce(&mut ServiceConfig) {
    let bot_key = bot_key.map(|k| Secret::new(k.to_string()));
    move |cfg| {
        cfg.app_data(web::Data::new(CatalogApi::new(catalog)))
            .app_data(web::Data::new(CustomerApi::new(customers)))
            .service(
                web::scope("/api")
                    .wrap(JwtAuthMiddlewareFactory::new(super::helpers::issuer()))
                    .service(ProductsRoute::<MockCatalogManager>::new())
                    .service(CreateProductRoute::<MockCatalogManager>::new())
                    .service(AdjustStockRoute::<MockCatalogManager>::new())
                    .service(DeleteCustomerRoute::<MockCustomerManager>::new()),
            )
            .service(
                web::scope("/bot/{merchant_id}")
                    .wrap(BotKeyMiddlewareFactory::new(bot_key))
                    .service(BotProductsRoute::<MockCatalogManager>::new())
                    .service(BotProductByIdRoute::<MockCatalogManager>::new())
                    .service(BotFindOrCreateCustomerRoute::<MockCustomerManager>::new()),
            );
    }
}

#[actix_web::test]
async fn create_product() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalogManager::new();
    catalog.expect_fetch_plan().returning(|_| Ok(Some(Plan::Basic)));
    catalog.expect_count_products().returning(|_| Ok(12));
    catalog
        .expect_insert_product()
        .withf(|m, p| m.as_str() == MERCHANT && p.name == "Coxinha" && p.stock == 40)
        .times(1)
        .returning(|_, p| Ok(product("p-coxinha", &p.name, p.price.value(), p.stock)));
    let token = issue_token(MERCHANT);
    let req = TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Coxinha", "price": 500, "stock": 40}));
    let (status, body) = send_request(req, configure(catalog, MockCustomerManager::new(), None)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let created: Product = serde_json::from_str(&body).unwrap();
    assert_eq!(created.price, Money::from(500));
}

#[actix_web::test]
async fn plan_limit_is_forbidden() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalogManager::new();
    catalog.expect_fetch_plan().returning(|_| Ok(Some(Plan::Basic)));
    catalog.expect_count_products().returning(|_| Ok(100));
    catalog.expect_insert_product().never();
    let token = issue_token(MERCHANT);
    let req = TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Pastel", "price": 800, "stock": 10}));
    let (status, _) = send_request(req, configure(catalog, MockCustomerManager::new(), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn invalid_products_are_rejected() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalogManager::new();
    catalog.expect_insert_product().never();
    let token = issue_token(MERCHANT);
    let req = TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Pastel", "price": -1, "stock": 10}));
    let (status, _) = send_request(req, configure(catalog, MockCustomerManager::new(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_bodies_get_a_json_error() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalogManager::new();
    catalog.expect_insert_product().never();
    let token = issue_token(MERCHANT);
    let req = TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "Pastel", "price": "oito reais"}));
    let (status, body) = send_request(req, configure(catalog, MockCustomerManager::new(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(error["error"].as_str().unwrap().starts_with("Could not read request body"), "{body}");
}

#[actix_web::test]
async fn stock_adjustment_below_zero() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalogManager::new();
    catalog
        .expect_adjust_stock()
        .withf(|_, id, delta| id.as_str() == "p-coxinha" && *delta == -50)
        .returning(|_, _, _| Err(CatalogApiError::InvalidInput("Stock cannot go below zero".into())));
    let token = issue_token(MERCHANT);
    let req = TestRequest::patch()
        .uri("/api/products/p-coxinha/stock")
        .insert_header(bearer(&token))
        .set_json(json!({"quantity": -50}));
    let (status, _) = send_request(req, configure(catalog, MockCustomerManager::new(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn customers_with_orders_conflict() {
    let _ = env_logger::try_init();
    let mut customers = MockCustomerManager::new();
    customers.expect_delete_customer().returning(|_, id| Err(CustomerApiError::CustomerHasOrders(id.clone())));
    let token = issue_token(MERCHANT);
    let req = TestRequest::delete().uri("/api/customers/c-ana").insert_header(bearer(&token));
    let (status, _) = send_request(req, configure(MockCatalogManager::new(), customers, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn bot_sees_active_products_only() {
    let _ = env_logger::try_init();
    let mut catalog = MockCatalogManager::new();
    catalog
        .expect_fetch_products()
        .withf(|m, active_only| m.as_str() == MERCHANT && *active_only)
        .times(1)
        .returning(|_, _| Ok(vec![product("p-coxinha", "Coxinha", 500, 40)]));
    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/products")).insert_header((BOT_KEY_HEADER, BOT_KEY));
    let (status, body) = send_request(req, configure(catalog, MockCustomerManager::new(), Some(BOT_KEY))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let products: Vec<Product> = serde_json::from_str(&body).unwrap();
    assert_eq!(products.len(), 1);

    let mut catalog = MockCatalogManager::new();
    catalog.expect_fetch_product().returning(|_, id| {
        let mut p = product(id.as_str(), "Bolo", 3500, 2);
        p.is_active = false;
        Ok(Some(p))
    });
    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/products/p-bolo")).insert_header((BOT_KEY_HEADER, BOT_KEY));
    let (status, _) = send_request(req, configure(catalog, MockCustomerManager::new(), Some(BOT_KEY))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn bot_routes_check_the_bot_key() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/products"));
    let (status, _) =
        send_request(req, configure(MockCatalogManager::new(), MockCustomerManager::new(), Some(BOT_KEY))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/products")).insert_header((BOT_KEY_HEADER, "errada"));
    let (status, body) =
        send_request(req, configure(MockCatalogManager::new(), MockCustomerManager::new(), Some(BOT_KEY))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("bot key"), "{body}");

    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/products")).insert_header((BOT_KEY_HEADER, "chave-do"));
    let (status, _) =
        send_request(req, configure(MockCatalogManager::new(), MockCustomerManager::new(), Some(BOT_KEY))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Without a configured key the bot routes are open
    let mut catalog = MockCatalogManager::new();
    catalog.expect_fetch_products().returning(|_, _| Ok(vec![]));
    let req = TestRequest::get().uri(&format!("/bot/{MERCHANT}/products"));
    let (status, _) = send_request(req, configure(catalog, MockCustomerManager::new(), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn bot_registers_customers_by_chat_id() {
    let _ = env_logger::try_init();
    let mut customers = MockCustomerManager::new();
    customers
        .expect_fetch_or_create_customer_by_chat_id()
        .withf(|m, c| m.as_str() == MERCHANT && c.chat_id.as_deref() == Some("5511999") && c.name == "Ana")
        .times(1)
        .returning(|_, c| Ok(customer("c-ana", c.chat_id.as_deref().unwrap_or_default(), &c.name)));
    let req = TestRequest::post()
        .uri(&format!("/bot/{MERCHANT}/customers"))
        .set_json(json!({"chat_id": "5511999", "name": "  Ana "}));
    let (status, body) = send_request(req, configure(MockCatalogManager::new(), customers, None)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let registered: Customer = serde_json::from_str(&body).unwrap();
    assert_eq!(registered.id, CustomerId::from("c-ana"));
}
