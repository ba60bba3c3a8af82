//! Short-lived shopping carts for chat customers.
//!
//! A chat conversation builds up an order one message at a time. Carts hold those line items in memory, keyed by
//! merchant and chat id, until the customer checks out or the cart expires.
use std::{collections::HashMap, sync::RwLock, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{CustomerId, LineItem, MerchantId, Money, PaymentMethod, ProductId},
    order_objects::NewOrderRequest,
};

pub const DEFAULT_CART_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Quantity must be positive, but was {0}")]
    InvalidQuantity(i64),
    #[error("The cart amounts are too large")]
    AmountTooLarge,
    #[error("Internal cart error. {0}")]
    LockError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub merchant_id: MerchantId,
    pub chat_id: String,
    pub items: Vec<LineItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    fn new(merchant_id: MerchantId, chat_id: String) -> Self {
        Self { merchant_id, chat_id, items: vec![], updated_at: Utc::now() }
    }

    pub fn total(&self) -> Result<Money, CartError> {
        let lines = self.items.iter().map(LineItem::line_total).collect::<Option<Vec<_>>>();
        lines.and_then(Money::checked_sum).ok_or(CartError::AmountTooLarge)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Builds the order request for this cart. The declared total is the sum of the cart's line items.
    pub fn to_order_request(
        &self,
        customer_id: CustomerId,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<NewOrderRequest, CartError> {
        if self.is_empty() {
            return Err(CartError::EmptyCart);
        }
        Ok(NewOrderRequest { customer_id, total: self.total()?, items: self.items.clone(), payment_method, notes })
    }
}

type CartKey = (MerchantId, String);

/// In-memory cart storage with a sliding expiry. Every modification restarts the cart's clock.
pub struct CartStore {
    ttl: chrono::Duration,
    carts: RwLock<HashMap<CartKey, Cart>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(DEFAULT_CART_TTL)
    }
}

impl CartStore {
    pub fn new(ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));
        Self { ttl, carts: RwLock::new(HashMap::new()) }
    }

    fn key(merchant_id: &MerchantId, chat_id: &str) -> CartKey {
        (merchant_id.clone(), chat_id.to_string())
    }

    fn is_expired(&self, cart: &Cart, now: DateTime<Utc>) -> bool {
        now - cart.updated_at >= self.ttl
    }

    /// Returns the cart for the chat, or an empty cart if there is none (or it has expired).
    pub fn cart(&self, merchant_id: &MerchantId, chat_id: &str) -> Result<Cart, CartError> {
        let carts = self.carts.read().map_err(|e| CartError::LockError(e.to_string()))?;
        let cart = carts
            .get(&Self::key(merchant_id, chat_id))
            .filter(|c| !self.is_expired(c, Utc::now()))
            .cloned()
            .unwrap_or_else(|| Cart::new(merchant_id.clone(), chat_id.to_string()));
        Ok(cart)
    }

    /// Adds the item to the cart. If the product is already in the cart, the quantities are merged and the latest
    /// name and price are kept. The cart is left untouched if its total would no longer fit in [`Money`].
    pub fn add_item(&self, merchant_id: &MerchantId, chat_id: &str, item: LineItem) -> Result<Cart, CartError> {
        if item.quantity <= 0 {
            return Err(CartError::InvalidQuantity(item.quantity));
        }
        let mut carts = self.carts.write().map_err(|e| CartError::LockError(e.to_string()))?;
        let now = Utc::now();
        let cart = carts
            .entry(Self::key(merchant_id, chat_id))
            .or_insert_with(|| Cart::new(merchant_id.clone(), chat_id.to_string()));
        if self.is_expired(cart, now) {
            debug!("🛒️ Cart for chat {chat_id} at {merchant_id} expired. Starting afresh");
            cart.items.clear();
        }
        let mut items = cart.items.clone();
        match items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or(CartError::AmountTooLarge)?;
                existing.price = item.price;
                existing.name = item.name;
            },
            None => items.push(item),
        }
        let merged = Cart { merchant_id: merchant_id.clone(), chat_id: chat_id.to_string(), items, updated_at: now };
        merged.total()?;
        *cart = merged;
        trace!("🛒️ Cart for chat {chat_id} at {merchant_id} now holds {} lines", cart.items.len());
        Ok(cart.clone())
    }

    /// Removes the product from the cart. Removing a product that is not in the cart is not an error.
    pub fn remove_item(&self, merchant_id: &MerchantId, chat_id: &str, product_id: &ProductId) -> Result<Cart, CartError> {
        let mut carts = self.carts.write().map_err(|e| CartError::LockError(e.to_string()))?;
        let key = Self::key(merchant_id, chat_id);
        let Some(cart) = carts.get_mut(&key) else {
            return Ok(Cart::new(merchant_id.clone(), chat_id.to_string()));
        };
        cart.items.retain(|i| &i.product_id != product_id);
        cart.updated_at = Utc::now();
        let cart = cart.clone();
        if cart.is_empty() {
            carts.remove(&key);
        }
        Ok(cart)
    }

    /// Takes the checked-out lines out of the cart, leaving anything added since the cart was read.
    ///
    /// Each checked-out quantity is subtracted from the matching line, and lines that reach zero are dropped. The
    /// cart is removed once it is empty.
    pub fn remove_checked_out(
        &self,
        merchant_id: &MerchantId,
        chat_id: &str,
        ordered: &[LineItem],
    ) -> Result<Cart, CartError> {
        let mut carts = self.carts.write().map_err(|e| CartError::LockError(e.to_string()))?;
        let key = Self::key(merchant_id, chat_id);
        let Some(cart) = carts.get_mut(&key) else {
            return Ok(Cart::new(merchant_id.clone(), chat_id.to_string()));
        };
        for done in ordered {
            if let Some(line) = cart.items.iter_mut().find(|i| i.product_id == done.product_id) {
                line.quantity = line.quantity.saturating_sub(done.quantity);
            }
        }
        cart.items.retain(|i| i.quantity > 0);
        let cart = cart.clone();
        if cart.is_empty() {
            carts.remove(&key);
        } else {
            debug!("🛒️ {} lines added during checkout stay in the cart for chat {chat_id} at {merchant_id}", cart.items.len());
        }
        Ok(cart)
    }

    /// Empties the cart. Returns true if there was a cart to clear.
    pub fn clear(&self, merchant_id: &MerchantId, chat_id: &str) -> Result<bool, CartError> {
        let mut carts = self.carts.write().map_err(|e| CartError::LockError(e.to_string()))?;
        Ok(carts.remove(&Self::key(merchant_id, chat_id)).is_some())
    }

    /// Drops every expired cart and returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CartError> {
        let mut carts = self.carts.write().map_err(|e| CartError::LockError(e.to_string()))?;
        let now = Utc::now();
        let before = carts.len();
        carts.retain(|_, cart| !self.is_expired(cart, now));
        Ok(before - carts.len())
    }

    pub fn len(&self) -> usize {
        self.carts.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
