use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{MerchantId, NewProduct, Plan, Product, ProductId, ProductUpdate},
    traits::{CatalogApiError, CatalogManagement},
};

/// Product catalog and stock management for merchants.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    /// Adds a product to the merchant's catalog, subject to the product limit of the merchant's plan.
    /// Merchants without a subscription on record are treated as being on the `BASIC` plan.
    pub async fn create_product(&self, merchant_id: &MerchantId, product: NewProduct) -> Result<Product, CatalogApiError> {
        let product = validate_new_product(product)?;
        let plan = self.db.fetch_plan(merchant_id).await?.unwrap_or(Plan::Basic);
        if let Some(limit) = plan.max_products() {
            let count = self.db.count_products(merchant_id).await?;
            if count >= limit {
                info!("🛍️ Merchant {merchant_id} has reached the {plan} limit of {limit} products");
                return Err(CatalogApiError::PlanLimitReached { plan, limit });
            }
        }
        let product = self.db.insert_product(merchant_id, product).await?;
        debug!("🛍️ Product {} ({}) added to catalog of {merchant_id}", product.id, product.name);
        Ok(product)
    }

    pub async fn product(&self, merchant_id: &MerchantId, product_id: &ProductId) -> Result<Product, CatalogApiError> {
        self.db
            .fetch_product(merchant_id, product_id)
            .await?
            .ok_or_else(|| CatalogApiError::ProductNotFound(product_id.clone()))
    }

    pub async fn products(&self, merchant_id: &MerchantId) -> Result<Vec<Product>, CatalogApiError> {
        self.db.fetch_products(merchant_id, false).await
    }

    /// The products a customer may order from. Deactivated products are hidden.
    pub async fn active_products(&self, merchant_id: &MerchantId) -> Result<Vec<Product>, CatalogApiError> {
        self.db.fetch_products(merchant_id, true).await
    }

    /// As [`Self::product`], but deactivated products are reported as not found.
    pub async fn active_product(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
    ) -> Result<Product, CatalogApiError> {
        match self.product(merchant_id, product_id).await? {
            p if p.is_active => Ok(p),
            _ => Err(CatalogApiError::ProductNotFound(product_id.clone())),
        }
    }

    pub async fn update_product(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogApiError> {
        let update = validate_product_update(update)?;
        if update.is_empty() {
            return self.product(merchant_id, product_id).await;
        }
        self.db
            .update_product(merchant_id, product_id, update)
            .await?
            .ok_or_else(|| CatalogApiError::ProductNotFound(product_id.clone()))
    }

    pub async fn delete_product(&self, merchant_id: &MerchantId, product_id: &ProductId) -> Result<(), CatalogApiError> {
        if self.db.delete_product(merchant_id, product_id).await? {
            debug!("🛍️ Product {product_id} removed from catalog of {merchant_id}");
            Ok(())
        } else {
            Err(CatalogApiError::ProductNotFound(product_id.clone()))
        }
    }

    /// Adds `delta` units (negative to remove) to the product's stock. The stock level can never go below zero.
    pub async fn adjust_stock(
        &self,
        merchant_id: &MerchantId,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<Product, CatalogApiError> {
        if delta == 0 {
            return self.product(merchant_id, product_id).await;
        }
        let product = self.db.adjust_stock(merchant_id, product_id, delta).await?;
        info!("🛍️ Stock of {} ({product_id}) adjusted by {delta}. Now {}", product.name, product.stock);
        Ok(product)
    }
}

fn validate_new_product(mut product: NewProduct) -> Result<NewProduct, CatalogApiError> {
    product.name = product.name.trim().to_string();
    if product.name.is_empty() {
        return Err(CatalogApiError::InvalidInput("Product name cannot be empty".into()));
    }
    if product.price.is_negative() {
        return Err(CatalogApiError::InvalidInput("Product price cannot be negative".into()));
    }
    if product.stock < 0 {
        return Err(CatalogApiError::InvalidInput("Product stock cannot be negative".into()));
    }
    Ok(product)
}

fn validate_product_update(mut update: ProductUpdate) -> Result<ProductUpdate, CatalogApiError> {
    if let Some(name) = update.name.take() {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogApiError::InvalidInput("Product name cannot be empty".into()));
        }
        update.name = Some(name);
    }
    if update.price.map(|p| p.is_negative()).unwrap_or(false) {
        return Err(CatalogApiError::InvalidInput("Product price cannot be negative".into()));
    }
    Ok(update)
}
