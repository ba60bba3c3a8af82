use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use pdv_common::Money;
use pdv_common::Secret;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------     Identifiers     ---------------------------------------------------------
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generates a fresh random (v4 UUID) identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type!(
    /// The tenant key. Every catalog, customer, order and bot record belongs to exactly one merchant.
    MerchantId
);
id_type!(ProductId);
id_type!(CustomerId);
id_type!(OrderId);
id_type!(SaleId);
id_type!(BotInstanceId);

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
/// The lifecycle of an order.
///
/// `Pending → Confirmed → Preparing → Ready → Delivered`, with `Canceled` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// Created by the order workflow. Stock has already been reserved.
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Canceled,
}

impl OrderStatusType {
    /// Position along the forward chain. `Canceled` sits off the chain.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Preparing => Some(2),
            Self::Ready => Some(3),
            Self::Delivered => Some(4),
            Self::Canceled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Whether moving from `self` to `next` is a legal transition. Forward moves may skip intermediate states.
    /// Re-applying the current status is not a transition.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PREPARING" => Ok(Self::Preparing),
            "READY" => Ok(Self::Ready),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELED" | "CANCELLED" => Ok(Self::Canceled),
            _ => Err(ConversionError { kind: "order status", value: s.to_string() }),
        }
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    Other,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cash => "CASH",
            Self::CreditCard => "CREDIT_CARD",
            Self::DebitCard => "DEBIT_CARD",
            Self::Pix => "PIX",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: ProductId,
    pub merchant_id: MerchantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Money, stock: i64) -> Self {
        Self { name: name.into(), price, stock, ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.description.is_none() &&
            self.price.is_none() &&
            self.category.is_none() &&
            self.image_url.is_none() &&
            self.is_active.is_none()
    }
}

//--------------------------------------       Customer      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub merchant_id: MerchantId,
    /// The chat front-end identity (e.g. Telegram chat id) this customer first contacted the merchant from.
    pub chat_id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub chat_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl NewCustomer {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_chat_id<S: Into<String>>(mut self, chat_id: S) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CustomerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.address.is_none() && self.notes.is_none()
    }
}

//--------------------------------------        Orders       ---------------------------------------------------------
/// A single line of an order. Orders keep a snapshot of these; they never change after the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

impl LineItem {
    pub fn new<S: Into<String>>(product_id: ProductId, name: S, price: Money, quantity: i64) -> Self {
        Self { product_id, name: name.into(), price, quantity }
    }

    /// Price times quantity, or `None` if that overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

/// An order that has passed validation and is ready to be written to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub merchant_id: MerchantId,
    pub customer_id: CustomerId,
    pub total: Money,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// The stock to reserve for this order: one entry per product, in the order products first appear, with the
    /// quantities of repeated lines added together.
    pub fn reservations(&self) -> Vec<(ProductId, i64)> {
        let mut result: Vec<(ProductId, i64)> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match result.iter_mut().find(|(id, _)| id == &item.product_id) {
                Some((_, quantity)) => *quantity = quantity.saturating_add(item.quantity),
                None => result.push((item.product_id.clone(), item.quantity)),
            }
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub merchant_id: MerchantId,
    pub customer_id: CustomerId,
    /// The customer's display name at the time the order was read.
    pub customer_name: Option<String>,
    pub total: Money,
    pub items: Vec<LineItem>,
    pub status: OrderStatusType,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn item_count(&self) -> i64 {
        self.items.iter().fold(0i64, |n, i| n.saturating_add(i.quantity))
    }
}

fn json_column<T: serde::de::DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode { index: column.to_string(), source: Box::new(e) })
}

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            merchant_id: row.try_get("merchant_id")?,
            customer_id: row.try_get("customer_id")?,
            customer_name: row.try_get("customer_name")?,
            total: row.try_get("total")?,
            items: json_column(row, "items")?,
            status: row.try_get("status")?,
            payment_method: row.try_get("payment_method")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------         Sale        ---------------------------------------------------------
/// Ledger entry mirroring an order at the moment it was placed. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub merchant_id: MerchantId,
    pub order_id: OrderId,
    pub total: Money,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for Sale {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            merchant_id: row.try_get("merchant_id")?,
            order_id: row.try_get("order_id")?,
            total: row.try_get("total")?,
            items: json_column(row, "items")?,
            payment_method: row.try_get("payment_method")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

//--------------------------------------   Merchants & plans  --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Merchant {
    pub id: MerchantId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewMerchant {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

/// Profile fields a merchant may change. An empty phone number removes the phone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerchantUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl MerchantUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

/// The stored password hash for a merchant. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct MerchantCredentials {
    pub id: MerchantId,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    Basic,
    Professional,
    Enterprise,
}

impl Plan {
    /// The maximum number of products a merchant on this plan may keep in their catalog. `None` means unlimited.
    pub fn max_products(&self) -> Option<i64> {
        match self {
            Self::Basic => Some(100),
            Self::Professional => Some(1000),
            Self::Enterprise => None,
        }
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Basic => "BASIC",
            Self::Professional => "PROFESSIONAL",
            Self::Enterprise => "ENTERPRISE",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: String,
    pub merchant_id: MerchantId,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Bots         ---------------------------------------------------------
pub const DEFAULT_WELCOME_MESSAGE: &str = "Olá! Bem-vindo ao nosso atendimento. Como posso ajudar?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub action: String,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSlot {
    /// 0 = Sunday
    pub day: u8,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<OpeningSlot>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    pub welcome_message: String,
    pub menu_items: Vec<MenuItem>,
    pub business_hours: BusinessHours,
    pub auto_reply: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            menu_items: vec![],
            business_hours: BusinessHours::default(),
            auto_reply: true,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BotInstance {
    pub id: BotInstanceId,
    pub merchant_id: MerchantId,
    pub bot_token: Option<Secret<String>>,
    pub is_active: bool,
    pub config: BotConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for BotInstance {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let bot_token: Option<String> = row.try_get("bot_token")?;
        let config = BotConfig {
            welcome_message: row.try_get("welcome_message")?,
            menu_items: json_column(row, "menu_items")?,
            business_hours: json_column(row, "business_hours")?,
            auto_reply: row.try_get("auto_reply")?,
            updated_at: row.try_get("config_updated_at")?,
        };
        Ok(Self {
            id: row.try_get("id")?,
            merchant_id: row.try_get("merchant_id")?,
            bot_token: bot_token.map(Secret::new),
            is_active: row.try_get("is_active")?,
            config,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotInstanceUpdate {
    pub bot_token: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfigUpdate {
    pub welcome_message: Option<String>,
    pub menu_items: Option<Vec<MenuItem>>,
    pub business_hours: Option<BusinessHours>,
    pub auto_reply: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStats {
    pub total_orders: i64,
    pub total_customers: i64,
    pub is_active: bool,
}
