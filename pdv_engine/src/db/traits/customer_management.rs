use thiserror::Error;

use crate::db_types::{Customer, CustomerId, CustomerUpdate, MerchantId, NewCustomer};

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Customer {0} does not exist")]
    CustomerNotFound(CustomerId),
    #[error("Invalid customer data. {0}")]
    InvalidInput(String),
    #[error("A customer with chat id {0} already exists")]
    DuplicateChatId(String),
    #[error("Customer {0} has orders and cannot be deleted")]
    CustomerHasOrders(CustomerId),
}

impl From<sqlx::Error> for CustomerApiError {
    fn from(e: sqlx::Error) -> Self {
        CustomerApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    async fn insert_customer(&self, merchant_id: &MerchantId, customer: NewCustomer)
        -> Result<Customer, CustomerApiError>;

    async fn fetch_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
    ) -> Result<Option<Customer>, CustomerApiError>;

    async fn fetch_customer_by_chat_id(
        &self,
        merchant_id: &MerchantId,
        chat_id: &str,
    ) -> Result<Option<Customer>, CustomerApiError>;

    /// Returns the customer registered under the chat id in `customer`, creating it first if necessary.
    /// Concurrent first contacts from the same chat resolve to the same customer.
    async fn fetch_or_create_customer_by_chat_id(
        &self,
        merchant_id: &MerchantId,
        customer: NewCustomer,
    ) -> Result<Customer, CustomerApiError>;

    async fn fetch_customers(&self, merchant_id: &MerchantId) -> Result<Vec<Customer>, CustomerApiError>;

    async fn update_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
        update: CustomerUpdate,
    ) -> Result<Option<Customer>, CustomerApiError>;

    /// Returns `true` if the customer was deleted. Customers with orders are never deleted.
    async fn delete_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
    ) -> Result<bool, CustomerApiError>;
}
