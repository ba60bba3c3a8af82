use thiserror::Error;

use crate::db_types::{MerchantId, NewProduct, Plan, Product, ProductId, ProductUpdate};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Invalid product data. {0}")]
    InvalidInput(String),
    #[error("The {plan} plan allows at most {limit} products")]
    PlanLimitReached { plan: Plan, limit: i64 },
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_product(&self, merchant_id: &MerchantId, product: NewProduct) -> Result<Product, CatalogApiError>;

    async fn fetch_product(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
    ) -> Result<Option<Product>, CatalogApiError>;

    /// Products for the merchant, newest first. If `active_only` is set, deactivated products are left out.
    async fn fetch_products(&self, merchant_id: &MerchantId, active_only: bool) -> Result<Vec<Product>, CatalogApiError>;

    async fn count_products(&self, merchant_id: &MerchantId) -> Result<i64, CatalogApiError>;

    /// The merchant's current plan, or `None` if the merchant has no subscription on record.
    async fn fetch_plan(&self, merchant_id: &MerchantId) -> Result<Option<Plan>, CatalogApiError>;

    /// Applies the non-empty fields of `update`. Returns `None` if the product does not exist.
    async fn update_product(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, CatalogApiError>;

    /// Returns `true` if a product was deleted.
    async fn delete_product(&self, merchant_id: &MerchantId, product_id: &ProductId) -> Result<bool, CatalogApiError>;

    /// Adds `delta` (which may be negative) to the product's stock as a single conditional update.
    /// Fails with `InvalidInput` if the result would be negative.
    async fn adjust_stock(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<Product, CatalogApiError>;
}
