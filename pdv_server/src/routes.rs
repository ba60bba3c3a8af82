//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! The routes fall into three groups:
//! * Public routes: `/health` and the `/auth` endpoints that hand out access tokens.
//! * Merchant routes, mounted under `/api` behind the JWT middleware. The merchant is always the one named in the
//!   access token.
//! * Chat front-end routes, mounted under `/bot/{merchant_id}` behind the bot key middleware.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database call in here is async for that reason.
use std::str::FromStr;

use actix_web::{delete, get, web, HttpResponse, Responder};
use log::*;
use pdv_engine::{
    db_types::{
        BotConfigUpdate,
        BotInstanceId,
        BotInstanceUpdate,
        CustomerId,
        CustomerUpdate,
        LineItem,
        MerchantId,
        MerchantUpdate,
        NewCustomer,
        NewProduct,
        OrderId,
        OrderStatusType,
        ProductId,
        ProductUpdate,
    },
    order_objects::{NewOrderRequest, OrderQueryFilter, StatusUpdateRequest},
    traits::{BotManagement, CatalogManagement, CustomerManagement, MerchantManagement, OrderManagement},
    BotApi,
    CartStore,
    CatalogApi,
    CustomerApi,
    MerchantApi,
    NotificationHub,
    OrderFlowApi,
    RegistrationRequest,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        AuthResponse,
        CartItemRequest,
        CheckoutRequest,
        CustomerChatRequest,
        JsonResponse,
        LoginRequest,
        OrderQueryParams,
        PasswordChange,
        StockAdjustment,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl MerchantManagement);
/// Creates a merchant account with a trial subscription and logs the new merchant in.
pub async fn register<B: MerchantManagement>(
    body: web::Json<RegistrationRequest>,
    api: web::Data<MerchantApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let profile = api.register(body.into_inner()).await?;
    let access_token = signer.issue_token(JwtClaims::from(&profile.merchant), None)?;
    Ok(HttpResponse::Created().json(AuthResponse { access_token, merchant: profile.merchant }))
}

route!(login => Post "/auth/login" impl MerchantManagement);
/// Exchanges an e-mail and password for an access token. The token is valid for the configured lifetime and does
/// NOT refresh.
pub async fn login<B: MerchantManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<MerchantApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request");
    let LoginRequest { email, password } = body.into_inner();
    let merchant = api.login(&email, &password).await?;
    let access_token = signer.issue_token(JwtClaims::from(&merchant), None)?;
    trace!("💻️ Issued access token for merchant {}", merchant.id);
    Ok(HttpResponse::Ok().json(AuthResponse { access_token, merchant }))
}

//----------------------------------------------   Account  ----------------------------------------------------
route!(my_profile => Get "/me" impl MerchantManagement);
pub async fn my_profile<B: MerchantManagement>(
    claims: JwtClaims,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for {}", claims.merchant_id);
    let profile = api.me(&claims.merchant_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(update_profile => Patch "/me" impl MerchantManagement);
pub async fn update_profile<B: MerchantManagement>(
    claims: JwtClaims,
    body: web::Json<MerchantUpdate>,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PATCH profile for {}", claims.merchant_id);
    let merchant = api.update_profile(&claims.merchant_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(merchant))
}

route!(change_password => Patch "/me/password" impl MerchantManagement);
pub async fn change_password<B: MerchantManagement>(
    claims: JwtClaims,
    body: web::Json<PasswordChange>,
    api: web::Data<MerchantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PasswordChange { old_password, new_password } = body.into_inner();
    api.change_password(&claims.merchant_id, &old_password, &new_password).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Password changed.")))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement);
pub async fn products<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let products = api.products(&claims.merchant_id).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(create_product => Post "/products" impl CatalogManagement);
pub async fn create_product<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.create_product(&claims.merchant_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(product_by_id => Get "/products/{product_id}" impl CatalogManagement);
pub async fn product_by_id<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<ProductId>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.product(&claims.merchant_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Patch "/products/{product_id}" impl CatalogManagement);
pub async fn update_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<ProductId>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.update_product(&claims.merchant_id, &path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{product_id}" impl CatalogManagement);
pub async fn delete_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<ProductId>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    api.delete_product(&claims.merchant_id, &product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {product_id} deleted."))))
}

route!(adjust_stock => Patch "/products/{product_id}/stock" impl CatalogManagement);
pub async fn adjust_stock<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<ProductId>,
    body: web::Json<StockAdjustment>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.adjust_stock(&claims.merchant_id, &path.into_inner(), body.quantity).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Customers  ----------------------------------------------------
route!(customers => Get "/customers" impl CustomerManagement);
pub async fn customers<B: CustomerManagement>(
    claims: JwtClaims,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customers = api.customers(&claims.merchant_id).await?;
    Ok(HttpResponse::Ok().json(customers))
}

route!(create_customer => Post "/customers" impl CustomerManagement);
pub async fn create_customer<B: CustomerManagement>(
    claims: JwtClaims,
    body: web::Json<NewCustomer>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer = api.create_customer(&claims.merchant_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(customer))
}

route!(customer_by_id => Get "/customers/{customer_id}" impl CustomerManagement);
pub async fn customer_by_id<B: CustomerManagement>(
    claims: JwtClaims,
    path: web::Path<CustomerId>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer = api.customer(&claims.merchant_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(update_customer => Patch "/customers/{customer_id}" impl CustomerManagement);
pub async fn update_customer<B: CustomerManagement>(
    claims: JwtClaims,
    path: web::Path<CustomerId>,
    body: web::Json<CustomerUpdate>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer = api.update_customer(&claims.merchant_id, &path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(delete_customer => Delete "/customers/{customer_id}" impl CustomerManagement);
pub async fn delete_customer<B: CustomerManagement>(
    claims: JwtClaims,
    path: web::Path<CustomerId>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    api.delete_customer(&claims.merchant_id, &customer_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Customer {customer_id} deleted."))))
}

route!(customer_orders => Get "/customers/{customer_id}/orders" impl OrderManagement);
pub async fn customer_orders<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<CustomerId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let orders = api.orders_for_customer(&claims.merchant_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders => Get "/orders" impl OrderManagement);
/// Lists the merchant's orders, newest first. Accepts optional `status`, `customer_id` and `limit` query parameters.
pub async fn orders<B: OrderManagement>(
    claims: JwtClaims,
    query: web::Query<OrderQueryParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = order_filter(query.into_inner())?;
    debug!("💻️ GET orders for {}. {filter}", claims.merchant_id);
    let orders = api.orders(&claims.merchant_id, filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(create_order => Post "/orders" impl OrderManagement);
pub async fn create_order<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, ServerError> {
    place_order(&claims.merchant_id, body.into_inner(), api.as_ref(), hub.as_ref()).await
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.order(&claims.merchant_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Patch "/orders/{order_id}/status" impl OrderManagement);
/// Moves an order along its lifecycle and tells the merchant's dashboards about it.
pub async fn update_order_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ Status update for order {order_id} to {}", body.status);
    let order = api.update_order_status(&claims.merchant_id, &order_id, body.status).await?;
    hub.notify_order_update(&claims.merchant_id, &order);
    Ok(HttpResponse::Ok().json(order))
}

route!(sales => Get "/sales" impl OrderManagement);
pub async fn sales<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let sales = api.sales(&claims.merchant_id).await?;
    Ok(HttpResponse::Ok().json(sales))
}

//----------------------------------------------   Bot settings  ----------------------------------------------------
route!(my_bot => Get "/bot" impl BotManagement);
/// Returns the merchant's bot, creating one with the default configuration on first use.
pub async fn my_bot<B: BotManagement>(
    claims: JwtClaims,
    api: web::Data<BotApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bot = api.bot_for_merchant(&claims.merchant_id).await?;
    Ok(HttpResponse::Ok().json(bot))
}

route!(update_bot => Patch "/bot/{bot_id}" impl BotManagement);
pub async fn update_bot<B: BotManagement>(
    claims: JwtClaims,
    path: web::Path<BotInstanceId>,
    body: web::Json<BotInstanceUpdate>,
    api: web::Data<BotApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bot = api.update_bot(&claims.merchant_id, &path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bot))
}

route!(update_bot_config => Patch "/bot/{bot_id}/config" impl BotManagement);
pub async fn update_bot_config<B: BotManagement>(
    claims: JwtClaims,
    path: web::Path<BotInstanceId>,
    body: web::Json<BotConfigUpdate>,
    api: web::Data<BotApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bot = api.update_config(&claims.merchant_id, &path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bot))
}

route!(activate_bot => Post "/bot/{bot_id}/activate" impl BotManagement);
pub async fn activate_bot<B: BotManagement>(
    claims: JwtClaims,
    path: web::Path<BotInstanceId>,
    api: web::Data<BotApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bot = api.activate(&claims.merchant_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bot))
}

route!(deactivate_bot => Post "/bot/{bot_id}/deactivate" impl BotManagement);
pub async fn deactivate_bot<B: BotManagement>(
    claims: JwtClaims,
    path: web::Path<BotInstanceId>,
    api: web::Data<BotApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bot = api.deactivate(&claims.merchant_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bot))
}

route!(bot_stats => Get "/bot/{bot_id}/stats" impl BotManagement);
pub async fn bot_stats<B: BotManagement>(
    claims: JwtClaims,
    path: web::Path<BotInstanceId>,
    api: web::Data<BotApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let stats = api.stats(&claims.merchant_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

//----------------------------------------------   Chat front-end  ----------------------------------------------------
// These routes are mounted under `/bot/{merchant_id}`, so every path extractor starts with the merchant id.

route!(bot_products => Get "/products" impl CatalogManagement);
/// The merchant's active products. Hidden products are never shown to chat customers.
pub async fn bot_products<B: CatalogManagement>(
    path: web::Path<MerchantId>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let products = api.active_products(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(bot_product_by_id => Get "/products/{product_id}" impl CatalogManagement);
pub async fn bot_product_by_id<B: CatalogManagement>(
    path: web::Path<(MerchantId, ProductId)>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, product_id) = path.into_inner();
    let product = api.active_product(&merchant_id, &product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(bot_customer_by_chat_id => Get "/customers/chat/{chat_id}" impl CustomerManagement);
pub async fn bot_customer_by_chat_id<B: CustomerManagement>(
    path: web::Path<(MerchantId, String)>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, chat_id) = path.into_inner();
    let customer = api.customer_by_chat_id(&merchant_id, &chat_id).await?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(bot_find_or_create_customer => Post "/customers" impl CustomerManagement);
/// Called on first contact from a chat. Returns the existing customer for the chat id if there is one.
pub async fn bot_find_or_create_customer<B: CustomerManagement>(
    path: web::Path<MerchantId>,
    body: web::Json<CustomerChatRequest>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CustomerChatRequest { chat_id, name } = body.into_inner();
    let customer = api.find_or_create_by_chat_id(&path.into_inner(), &chat_id, &name).await?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(bot_create_order => Post "/orders" impl OrderManagement);
/// Places an order on behalf of a chat customer. On success the order is announced to the merchant's dashboards.
pub async fn bot_create_order<B: OrderManagement>(
    path: web::Path<MerchantId>,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, ServerError> {
    place_order(&path.into_inner(), body.into_inner(), api.as_ref(), hub.as_ref()).await
}

route!(bot_order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn bot_order_by_id<B: OrderManagement>(
    path: web::Path<(MerchantId, OrderId)>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, order_id) = path.into_inner();
    let order = api.order(&merchant_id, &order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(bot_customer_orders => Get "/customers/{customer_id}/orders" impl OrderManagement);
pub async fn bot_customer_orders<B: OrderManagement>(
    path: web::Path<(MerchantId, CustomerId)>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, customer_id) = path.into_inner();
    let orders = api.orders_for_customer(&merchant_id, &customer_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(bot_config => Get "/config" impl BotManagement);
pub async fn bot_config<B: BotManagement>(
    path: web::Path<MerchantId>,
    api: web::Data<BotApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let config = api.config_for_merchant(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(config))
}

//----------------------------------------------   Carts  ----------------------------------------------------
#[get("/carts/{chat_id}")]
pub async fn cart(
    path: web::Path<(MerchantId, String)>,
    carts: web::Data<CartStore>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, chat_id) = path.into_inner();
    let cart = carts.cart(&merchant_id, &chat_id)?;
    Ok(HttpResponse::Ok().json(cart))
}

#[delete("/carts/{chat_id}")]
pub async fn clear_cart(
    path: web::Path<(MerchantId, String)>,
    carts: web::Data<CartStore>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, chat_id) = path.into_inner();
    let cleared = carts.clear(&merchant_id, &chat_id)?;
    let message = if cleared { "Cart cleared." } else { "The cart was already empty." };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

route!(add_cart_item => Post "/carts/{chat_id}/items" impl CatalogManagement);
/// Adds a product to the chat's cart. The product's current name and price are captured in the line item.
pub async fn add_cart_item<B: CatalogManagement>(
    path: web::Path<(MerchantId, String)>,
    body: web::Json<CartItemRequest>,
    catalog: web::Data<CatalogApi<B>>,
    carts: web::Data<CartStore>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, chat_id) = path.into_inner();
    let CartItemRequest { product_id, quantity } = body.into_inner();
    let product = catalog.active_product(&merchant_id, &product_id).await?;
    let item = LineItem::new(product.id, product.name, product.price, quantity);
    let updated_cart = carts.add_item(&merchant_id, &chat_id, item)?;
    Ok(HttpResponse::Ok().json(updated_cart))
}

#[delete("/carts/{chat_id}/items/{product_id}")]
pub async fn remove_cart_item(
    path: web::Path<(MerchantId, String, ProductId)>,
    carts: web::Data<CartStore>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, chat_id, product_id) = path.into_inner();
    let updated_cart = carts.remove_item(&merchant_id, &chat_id, &product_id)?;
    Ok(HttpResponse::Ok().json(updated_cart))
}

route!(checkout => Post "/carts/{chat_id}/checkout" impl OrderManagement, CustomerManagement);
/// Turns the chat's cart into an order. The ordered lines leave the cart only once the order has been placed.
pub async fn checkout<BO: OrderManagement, BC: CustomerManagement>(
    path: web::Path<(MerchantId, String)>,
    body: web::Json<CheckoutRequest>,
    orders: web::Data<OrderFlowApi<BO>>,
    customers: web::Data<CustomerApi<BC>>,
    carts: web::Data<CartStore>,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, ServerError> {
    let (merchant_id, chat_id) = path.into_inner();
    let CheckoutRequest { payment_method, notes } = body.into_inner();
    let chat_cart = carts.cart(&merchant_id, &chat_id)?;
    let customer = customers.customer_by_chat_id(&merchant_id, &chat_id).await?;
    let request = chat_cart.to_order_request(customer.id, payment_method, notes)?;
    let response = place_order(&merchant_id, request, orders.as_ref(), hub.as_ref()).await?;
    carts.remove_checked_out(&merchant_id, &chat_id, &chat_cart.items)?;
    debug!("🛒️ Checked out cart for chat {chat_id} at merchant {merchant_id}");
    Ok(response)
}

//----------------------------------------------   Helpers  ----------------------------------------------------
async fn place_order<B: OrderManagement>(
    merchant_id: &MerchantId,
    request: NewOrderRequest,
    api: &OrderFlowApi<B>,
    hub: &NotificationHub,
) -> Result<HttpResponse, ServerError> {
    let order = api.place_order(merchant_id, request).await.map_err(|e| {
        debug!("💻️ Order for merchant {merchant_id} was not placed. {e}");
        e
    })?;
    let sessions = hub.notify_new_order(merchant_id, &order);
    trace!("💻️ New order {} announced to {sessions} sessions", order.id);
    Ok(HttpResponse::Created().json(order))
}

fn order_filter(params: OrderQueryParams) -> Result<OrderQueryFilter, ServerError> {
    let mut filter = OrderQueryFilter::default();
    if let Some(status) = params.status.filter(|s| !s.is_empty()) {
        let status = OrderStatusType::from_str(&status).map_err(|e| ServerError::InvalidInput(e.to_string()))?;
        filter = filter.with_status(status);
    }
    if let Some(customer_id) = params.customer_id.filter(|s| !s.is_empty()) {
        filter = filter.with_customer_id(CustomerId::from(customer_id));
    }
    if let Some(limit) = params.limit {
        if limit <= 0 {
            return Err(ServerError::InvalidInput(format!("limit must be positive, but was {limit}")));
        }
        filter = filter.with_limit(limit);
    }
    Ok(filter)
}
