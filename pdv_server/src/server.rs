use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use pdv_engine::{BotApi, CartStore, CatalogApi, CustomerApi, MerchantApi, NotificationHub, OrderFlowApi, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    cart_worker::{start_cart_worker, CART_PURGE_INTERVAL},
    config::ServerConfig,
    errors::ServerError,
    middleware::{BotKeyMiddlewareFactory, JwtAuthMiddlewareFactory},
    notifications_ws::notifications,
    routes::{
        cart,
        clear_cart,
        health,
        remove_cart_item,
        ActivateBotRoute,
        AddCartItemRoute,
        AdjustStockRoute,
        BotConfigRoute,
        BotCreateOrderRoute,
        BotCustomerByChatIdRoute,
        BotCustomerOrdersRoute,
        BotFindOrCreateCustomerRoute,
        BotOrderByIdRoute,
        BotProductByIdRoute,
        BotProductsRoute,
        BotStatsRoute,
        ChangePasswordRoute,
        CheckoutRoute,
        CreateCustomerRoute,
        CreateOrderRoute,
        CreateProductRoute,
        CustomerByIdRoute,
        CustomerOrdersRoute,
        CustomersRoute,
        DeactivateBotRoute,
        DeleteCustomerRoute,
        DeleteProductRoute,
        LoginRoute,
        MyBotRoute,
        MyProfileRoute,
        OrderByIdRoute,
        OrdersRoute,
        ProductByIdRoute,
        ProductsRoute,
        RegisterRoute,
        SalesRoute,
        UpdateBotConfigRoute,
        UpdateBotRoute,
        UpdateCustomerRoute,
        UpdateOrderStatusRoute,
        UpdateProductRoute,
        UpdateProfileRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, config.max_connections, config.acquire_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let hub = web::Data::new(NotificationHub::new());
    let carts = web::Data::new(CartStore::new(config.cart_ttl));
    // Not awaited: the worker lives as long as the server
    let _cart_worker = start_cart_worker(carts.clone(), CART_PURGE_INTERVAL);
    let srv = create_server_instance(config, db, hub, carts)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Malformed bodies, paths and query strings are reported with the same JSON error body as every other failure.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|e, _| ServerError::InvalidRequestBody(e.to_string()).into()))
        .app_data(web::PathConfig::default().error_handler(|e, _| ServerError::InvalidRequestPath(e.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|e, _| ServerError::InvalidInput(e.to_string()).into()));
}

/// Builds the HTTP server. The notification hub and cart store are shared by every worker thread, so they are
/// created by the caller and handed in.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    hub: web::Data<NotificationHub>,
    carts: web::Data<CartStore>,
) -> Result<Server, ServerError> {
    let policy = config.order_policy;
    let bot_api_key = config.bot_api_key.clone();
    let issuer = TokenIssuer::new(&config.auth);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), policy);
        let catalog_api = CatalogApi::new(db.clone());
        let customer_api = CustomerApi::new(db.clone());
        let merchant_api = MerchantApi::new(db.clone());
        let bot_api = BotApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pdv::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(customer_api))
            .app_data(web::Data::new(merchant_api))
            .app_data(web::Data::new(bot_api))
            .app_data(web::Data::new(issuer.clone()))
            .app_data(hub.clone())
            .app_data(carts.clone())
            .configure(configure_extractors);
        // Routes for the merchant dashboard. The merchant is taken from the access token.
        let api_scope = web::scope("/api")
            .wrap(JwtAuthMiddlewareFactory::new(issuer.clone()))
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(UpdateProfileRoute::<SqliteDatabase>::new())
            .service(ChangePasswordRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(AdjustStockRoute::<SqliteDatabase>::new())
            .service(CustomersRoute::<SqliteDatabase>::new())
            .service(CreateCustomerRoute::<SqliteDatabase>::new())
            .service(CustomerByIdRoute::<SqliteDatabase>::new())
            .service(UpdateCustomerRoute::<SqliteDatabase>::new())
            .service(DeleteCustomerRoute::<SqliteDatabase>::new())
            .service(CustomerOrdersRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(SalesRoute::<SqliteDatabase>::new())
            .service(MyBotRoute::<SqliteDatabase>::new())
            .service(UpdateBotRoute::<SqliteDatabase>::new())
            .service(UpdateBotConfigRoute::<SqliteDatabase>::new())
            .service(ActivateBotRoute::<SqliteDatabase>::new())
            .service(DeactivateBotRoute::<SqliteDatabase>::new())
            .service(BotStatsRoute::<SqliteDatabase>::new());
        // Routes for the chat front-end, acting on behalf of a merchant's customers
        let bot_scope = web::scope("/bot/{merchant_id}")
            .wrap(BotKeyMiddlewareFactory::new(bot_api_key.clone()))
            .service(BotProductsRoute::<SqliteDatabase>::new())
            .service(BotProductByIdRoute::<SqliteDatabase>::new())
            .service(BotCustomerByChatIdRoute::<SqliteDatabase>::new())
            .service(BotFindOrCreateCustomerRoute::<SqliteDatabase>::new())
            .service(BotCustomerOrdersRoute::<SqliteDatabase>::new())
            .service(BotCreateOrderRoute::<SqliteDatabase>::new())
            .service(BotOrderByIdRoute::<SqliteDatabase>::new())
            .service(BotConfigRoute::<SqliteDatabase>::new())
            .service(cart)
            .service(clear_cart)
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(remove_cart_item)
            .service(CheckoutRoute::<SqliteDatabase, SqliteDatabase>::new());
        app.service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(notifications)
            .service(api_scope)
            .service(bot_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Server listening on {}:{}", config.host, config.port);
    Ok(srv)
}
