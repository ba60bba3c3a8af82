//! `SqliteDatabase` is the concrete storage backend of the point-of-sale engine.
//!
//! It uses SQLite and implements all the traits defined in the [`traits`](crate::traits) module.
use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{
    bots,
    customers,
    db_url,
    is_unique_violation,
    merchants,
    new_pool,
    orders,
    products,
    sales,
    DEFAULT_ACQUIRE_TIMEOUT,
};
use crate::{
    db_types::{
        BotConfig,
        BotConfigUpdate,
        BotInstance,
        BotInstanceId,
        BotInstanceUpdate,
        BotStats,
        Customer,
        CustomerId,
        CustomerUpdate,
        Merchant,
        MerchantCredentials,
        MerchantId,
        MerchantUpdate,
        NewCustomer,
        NewMerchant,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        Plan,
        Product,
        ProductId,
        ProductUpdate,
        Sale,
        Subscription,
        SubscriptionStatus,
    },
    order_objects::OrderQueryFilter,
    traits::{
        BotApiError,
        BotManagement,
        CatalogApiError,
        CatalogManagement,
        CustomerApiError,
        CustomerManagement,
        MerchantApiError,
        MerchantManagement,
        OrderFlowError,
        OrderManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    /// Places the order in one transaction.
    ///
    /// The stock decrements are the first statements of the transaction, so the write lock is taken before stock is
    /// read. Lines for the same product are reserved as one decrement. Every decrement is conditional on enough stock
    /// being available, and its affected-row count is checked. Only when a decrement changes nothing do we read the
    /// product, inside the same transaction, to report why. Returning early drops `tx`, which rolls everything back.
    async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let merchant_id = &order.merchant_id;
        let mut tx = self.pool.begin().await?;
        for (product_id, quantity) in order.reservations() {
            let changed = products::decrement_stock(merchant_id, &product_id, quantity, &mut tx).await?;
            if changed == 1 {
                trace!("🗃️ Reserved {quantity} x {product_id} for order {}", order.id);
                continue;
            }
            let err = match products::fetch_product(merchant_id, &product_id, &mut tx).await? {
                None => OrderFlowError::ProductNotFound(product_id),
                Some(product) => OrderFlowError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    requested: quantity,
                    available: product.stock,
                },
            };
            debug!("🗃️ Order {} rolled back. {err}", order.id);
            return Err(err);
        }
        if customers::fetch_customer(merchant_id, &order.customer_id, &mut tx).await?.is_none() {
            debug!("🗃️ Order {} rolled back. Customer {} is unknown", order.id, order.customer_id);
            return Err(OrderFlowError::CustomerNotFound(order.customer_id));
        }
        orders::insert_order(&order, &mut tx).await?;
        let sale_id = sales::insert_sale(&order, &mut tx).await?;
        let placed = orders::fetch_order(merchant_id, &order.id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::DatabaseError(format!("Order {} vanished after insert", order.id)))?;
        tx.commit().await?;
        debug!("🗃️ Order {} ({}) committed with sale {sale_id}", placed.id, placed.total);
        Ok(placed)
    }

    async fn fetch_order(&self, merchant_id: &MerchantId, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(merchant_id, order_id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(
        &self,
        merchant_id: &MerchantId,
        query: OrderQueryFilter,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(merchant_id, query, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        merchant_id: &MerchantId,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        restock: bool,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let changed = orders::update_order_status(merchant_id, order_id, from, to, &mut tx).await?;
        if changed == 0 {
            return match orders::fetch_order(merchant_id, order_id, &mut tx).await? {
                None => Err(OrderFlowError::OrderNotFound(order_id.clone())),
                Some(_) => Err(OrderFlowError::OrderModified(order_id.clone())),
            };
        }
        let order = orders::fetch_order(merchant_id, order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if restock {
            for item in &order.items {
                let n = products::increment_stock(merchant_id, &item.product_id, item.quantity, &mut tx).await?;
                if n == 0 {
                    warn!("🗃️ Could not restock {} for order {order_id}. The product no longer exists", item.product_id);
                }
            }
            debug!("🗃️ Stock returned for the {} line items of order {order_id}", order.items.len());
        }
        tx.commit().await?;
        debug!("🗃️ Order {order_id} moved from {from} to {to}");
        Ok(order)
    }

    async fn fetch_sales(&self, merchant_id: &MerchantId) -> Result<Vec<Sale>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let sales = sales::fetch_sales(merchant_id, &mut conn).await?;
        Ok(sales)
    }

    async fn fetch_sale_for_order(
        &self,
        merchant_id: &MerchantId,
        order_id: &OrderId,
    ) -> Result<Option<Sale>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let sale = sales::fetch_sale_for_order(merchant_id, order_id, &mut conn).await?;
        Ok(sale)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, merchant_id: &MerchantId, product: NewProduct) -> Result<Product, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(merchant_id, product, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
    ) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(merchant_id, product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self, merchant_id: &MerchantId, active_only: bool) -> Result<Vec<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(merchant_id, active_only, &mut conn).await?;
        Ok(products)
    }

    async fn count_products(&self, merchant_id: &MerchantId) -> Result<i64, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = products::count_products(merchant_id, &mut conn).await?;
        Ok(count)
    }

    async fn fetch_plan(&self, merchant_id: &MerchantId) -> Result<Option<Plan>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let plan = products::fetch_plan(merchant_id, &mut conn).await?;
        Ok(plan)
    }

    async fn update_product(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::update_product(merchant_id, product_id, update, &mut conn).await?;
        Ok(product)
    }

    async fn delete_product(&self, merchant_id: &MerchantId, product_id: &ProductId) -> Result<bool, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = products::delete_product(merchant_id, product_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn adjust_stock(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<Product, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        if let Some(product) = products::adjust_stock(merchant_id, product_id, delta, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Stock for {product_id} adjusted by {delta} to {}", product.stock);
            return Ok(product);
        }
        match products::fetch_product(merchant_id, product_id, &mut tx).await? {
            None => Err(CatalogApiError::ProductNotFound(product_id.clone())),
            Some(p) => Err(CatalogApiError::InvalidInput(format!(
                "Cannot adjust the stock of {} by {delta}. Only {} in stock",
                p.name, p.stock
            ))),
        }
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn insert_customer(
        &self,
        merchant_id: &MerchantId,
        customer: NewCustomer,
    ) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let chat_id = customer.chat_id.clone();
        customers::insert_customer(merchant_id, customer, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                CustomerApiError::DuplicateChatId(chat_id.unwrap_or_default())
            } else {
                e.into()
            }
        })
    }

    async fn fetch_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
    ) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(merchant_id, customer_id, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_customer_by_chat_id(
        &self,
        merchant_id: &MerchantId,
        chat_id: &str,
    ) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer_by_chat_id(merchant_id, chat_id, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_or_create_customer_by_chat_id(
        &self,
        merchant_id: &MerchantId,
        customer: NewCustomer,
    ) -> Result<Customer, CustomerApiError> {
        let chat_id = customer
            .chat_id
            .clone()
            .ok_or_else(|| CustomerApiError::InvalidInput("A chat id is required".into()))?;
        let mut conn = self.pool.acquire().await?;
        if customers::insert_customer_if_new_chat(merchant_id, customer, &mut conn).await? {
            debug!("🗃️ New customer for chat {chat_id} at merchant {merchant_id}");
        }
        customers::fetch_customer_by_chat_id(merchant_id, &chat_id, &mut conn)
            .await?
            .ok_or_else(|| CustomerApiError::DatabaseError(format!("Customer for chat {chat_id} vanished after insert")))
    }

    async fn fetch_customers(&self, merchant_id: &MerchantId) -> Result<Vec<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customers = customers::fetch_customers(merchant_id, &mut conn).await?;
        Ok(customers)
    }

    async fn update_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::update_customer(merchant_id, customer_id, update, &mut conn).await?;
        Ok(customer)
    }

    async fn delete_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
    ) -> Result<bool, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = customers::delete_customer(merchant_id, customer_id, &mut conn).await.map_err(|e| {
            // orders.customer_id is a foreign key, so SQLite refuses to orphan them
            match e.as_database_error().map(|d| d.is_foreign_key_violation()) {
                Some(true) => CustomerApiError::CustomerHasOrders(customer_id.clone()),
                _ => e.into(),
            }
        })?;
        Ok(deleted)
    }
}

impl MerchantManagement for SqliteDatabase {
    async fn insert_merchant(
        &self,
        merchant: NewMerchant,
        trial_ends: DateTime<Utc>,
    ) -> Result<(Merchant, Subscription), MerchantApiError> {
        let email = merchant.email.clone();
        let mut tx = self.pool.begin().await?;
        let merchant = merchants::insert_merchant(merchant, &mut tx).await.map_err(|e| {
            if is_unique_violation(&e) {
                MerchantApiError::EmailAlreadyRegistered(email)
            } else {
                e.into()
            }
        })?;
        let subscription =
            merchants::insert_subscription(&merchant.id, Plan::Basic, SubscriptionStatus::Trialing, trial_ends, &mut tx)
                .await?;
        tx.commit().await?;
        debug!("🗃️ Merchant {} registered with a {} trial until {trial_ends}", merchant.id, subscription.plan);
        Ok((merchant, subscription))
    }

    async fn fetch_merchant(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let merchant = merchants::fetch_merchant(merchant_id, &mut conn).await?;
        Ok(merchant)
    }

    async fn fetch_credentials_by_email(&self, email: &str) -> Result<Option<MerchantCredentials>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let creds = merchants::fetch_credentials_by_email(email, &mut conn).await?;
        Ok(creds)
    }

    async fn fetch_credentials(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Option<MerchantCredentials>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let creds = merchants::fetch_credentials(merchant_id, &mut conn).await?;
        Ok(creds)
    }

    async fn fetch_subscription(&self, merchant_id: &MerchantId) -> Result<Option<Subscription>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let subscription = merchants::fetch_subscription(merchant_id, &mut conn).await?;
        Ok(subscription)
    }

    async fn record_login(&self, merchant_id: &MerchantId) -> Result<(), MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::record_login(merchant_id, &mut conn).await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        merchant_id: &MerchantId,
        update: MerchantUpdate,
    ) -> Result<Option<Merchant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        let merchant = merchants::update_profile(merchant_id, update, &mut conn).await?;
        Ok(merchant)
    }

    async fn update_password_hash(
        &self,
        merchant_id: &MerchantId,
        password_hash: &str,
    ) -> Result<(), MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        match merchants::update_password_hash(merchant_id, password_hash, &mut conn).await? {
            0 => Err(MerchantApiError::MerchantNotFound(merchant_id.clone())),
            _ => Ok(()),
        }
    }
}

impl BotManagement for SqliteDatabase {
    async fn fetch_bot_for_merchant(&self, merchant_id: &MerchantId) -> Result<Option<BotInstance>, BotApiError> {
        let mut conn = self.pool.acquire().await?;
        let bot = bots::fetch_bot_for_merchant(merchant_id, &mut conn).await?;
        Ok(bot)
    }

    async fn insert_bot(&self, merchant_id: &MerchantId, config: BotConfig) -> Result<BotInstance, BotApiError> {
        let mut tx = self.pool.begin().await?;
        if let Some(id) = bots::insert_bot_instance(merchant_id, &mut tx).await? {
            bots::insert_bot_config(&id, &config, &mut tx).await?;
        }
        let bot = bots::fetch_bot_for_merchant(merchant_id, &mut tx)
            .await?
            .ok_or_else(|| BotApiError::NoBotForMerchant(merchant_id.clone()))?;
        tx.commit().await?;
        Ok(bot)
    }

    async fn fetch_bot(
        &self,
        merchant_id: &MerchantId,
        bot_id: &BotInstanceId,
    ) -> Result<Option<BotInstance>, BotApiError> {
        let mut conn = self.pool.acquire().await?;
        let bot = bots::fetch_bot(merchant_id, bot_id, &mut conn).await?;
        Ok(bot)
    }

    async fn update_bot(
        &self,
        merchant_id: &MerchantId,
        bot_id: &BotInstanceId,
        update: BotInstanceUpdate,
    ) -> Result<Option<BotInstance>, BotApiError> {
        let mut tx = self.pool.begin().await?;
        if bots::update_bot_instance(merchant_id, bot_id, update, &mut tx).await? == 0 {
            return Ok(None);
        }
        let bot = bots::fetch_bot(merchant_id, bot_id, &mut tx).await?;
        tx.commit().await?;
        Ok(bot)
    }

    async fn update_bot_config(
        &self,
        merchant_id: &MerchantId,
        bot_id: &BotInstanceId,
        update: BotConfigUpdate,
    ) -> Result<Option<BotInstance>, BotApiError> {
        let mut tx = self.pool.begin().await?;
        // Touching the instance first both checks ownership and takes the write lock
        let touched = bots::update_bot_instance(merchant_id, bot_id, BotInstanceUpdate::default(), &mut tx).await?;
        if touched == 0 {
            return Ok(None);
        }
        bots::update_bot_config(bot_id, update, &mut tx).await?;
        let bot = bots::fetch_bot(merchant_id, bot_id, &mut tx).await?;
        tx.commit().await?;
        Ok(bot)
    }

    async fn bot_stats(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId) -> Result<Option<BotStats>, BotApiError> {
        let mut conn = self.pool.acquire().await?;
        let bot = match bots::fetch_bot(merchant_id, bot_id, &mut conn).await? {
            Some(b) => b,
            None => return Ok(None),
        };
        let total_orders = orders::count_orders_for_merchant(merchant_id, &mut conn).await?;
        let total_customers = customers::count_customers(merchant_id, &mut conn).await?;
        Ok(Some(BotStats { total_orders, total_customers, is_active: bot.is_active }))
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in the `PDV_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_options(url, max_connections, DEFAULT_ACQUIRE_TIMEOUT).await
    }

    /// As [`Self::new_with_url`], but callers waiting on a pool connection give up after `acquire_timeout`.
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, acquire_timeout).await?;
        info!("🗃️ Connected to {url} with up to {max_connections} connections");
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
