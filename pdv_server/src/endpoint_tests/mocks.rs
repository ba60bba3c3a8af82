use chrono::{DateTime, Utc};
use mockall::mock;
use pdv_engine::{
    db_types::*,
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

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;
        async fn fetch_order(&self, merchant_id: &MerchantId, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError>;
        async fn search_orders(&self, merchant_id: &MerchantId, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
        async fn update_order_status(&self, merchant_id: &MerchantId, order_id: &OrderId, from: OrderStatusType, to: OrderStatusType, restock: bool) -> Result<Order, OrderFlowError>;
        async fn fetch_sales(&self, merchant_id: &MerchantId) -> Result<Vec<Sale>, OrderFlowError>;
        async fn fetch_sale_for_order(&self, merchant_id: &MerchantId, order_id: &OrderId) -> Result<Option<Sale>, OrderFlowError>;
    }
}

mock! {
    pub CatalogManager {}
    impl CatalogManagement for CatalogManager {
        async fn insert_product(&self, merchant_id: &MerchantId, product: NewProduct) -> Result<Product, CatalogApiError>;
        async fn fetch_product(&self, merchant_id: &MerchantId, product_id: &ProductId) -> Result<Option<Product>, CatalogApiError>;
        async fn fetch_products(&self, merchant_id: &MerchantId, active_only: bool) -> Result<Vec<Product>, CatalogApiError>;
        async fn count_products(&self, merchant_id: &MerchantId) -> Result<i64, CatalogApiError>;
        async fn fetch_plan(&self, merchant_id: &MerchantId) -> Result<Option<Plan>, CatalogApiError>;
        async fn update_product(&self, merchant_id: &MerchantId, product_id: &ProductId, update: ProductUpdate) -> Result<Option<Product>, CatalogApiError>;
        async fn delete_product(&self, merchant_id: &MerchantId, product_id: &ProductId) -> Result<bool, CatalogApiError>;
        async fn adjust_stock(&self, merchant_id: &MerchantId, product_id: &ProductId, delta: i64) -> Result<Product, CatalogApiError>;
    }
}

mock! {
    pub CustomerManager {}
    impl CustomerManagement for CustomerManager {
        async fn insert_customer(&self, merchant_id: &MerchantId, customer: NewCustomer) -> Result<Customer, CustomerApiError>;
        async fn fetch_customer(&self, merchant_id: &MerchantId, customer_id: &CustomerId) -> Result<Option<Customer>, CustomerApiError>;
        async fn fetch_customer_by_chat_id(&self, merchant_id: &MerchantId, chat_id: &str) -> Result<Option<Customer>, CustomerApiError>;
        async fn fetch_or_create_customer_by_chat_id(&self, merchant_id: &MerchantId, customer: NewCustomer) -> Result<Customer, CustomerApiError>;
        async fn fetch_customers(&self, merchant_id: &MerchantId) -> Result<Vec<Customer>, CustomerApiError>;
        async fn update_customer(&self, merchant_id: &MerchantId, customer_id: &CustomerId, update: CustomerUpdate) -> Result<Option<Customer>, CustomerApiError>;
        async fn delete_customer(&self, merchant_id: &MerchantId, customer_id: &CustomerId) -> Result<bool, CustomerApiError>;
    }
}

mock! {
    pub MerchantManager {}
    impl MerchantManagement for MerchantManager {
        async fn insert_merchant(&self, merchant: NewMerchant, trial_ends: DateTime<Utc>) -> Result<(Merchant, Subscription), MerchantApiError>;
        async fn fetch_merchant(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>, MerchantApiError>;
        async fn fetch_credentials_by_email(&self, email: &str) -> Result<Option<MerchantCredentials>, MerchantApiError>;
        async fn fetch_credentials(&self, merchant_id: &MerchantId) -> Result<Option<MerchantCredentials>, MerchantApiError>;
        async fn fetch_subscription(&self, merchant_id: &MerchantId) -> Result<Option<Subscription>, MerchantApiError>;
        async fn record_login(&self, merchant_id: &MerchantId) -> Result<(), MerchantApiError>;
        async fn update_profile(&self, merchant_id: &MerchantId, update: MerchantUpdate) -> Result<Option<Merchant>, MerchantApiError>;
        async fn update_password_hash(&self, merchant_id: &MerchantId, password_hash: &str) -> Result<(), MerchantApiError>;
    }
}

mock! {
    pub BotManager {}
    impl BotManagement for BotManager {
        async fn fetch_bot_for_merchant(&self, merchant_id: &MerchantId) -> Result<Option<BotInstance>, BotApiError>;
        async fn insert_bot(&self, merchant_id: &MerchantId, config: BotConfig) -> Result<BotInstance, BotApiError>;
        async fn fetch_bot(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId) -> Result<Option<BotInstance>, BotApiError>;
        async fn update_bot(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId, update: BotInstanceUpdate) -> Result<Option<BotInstance>, BotApiError>;
        async fn update_bot_config(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId, update: BotConfigUpdate) -> Result<Option<BotInstance>, BotApiError>;
        async fn bot_stats(&self, merchant_id: &MerchantId, bot_id: &BotInstanceId) -> Result<Option<BotStats>, BotApiError>;
    }
}
