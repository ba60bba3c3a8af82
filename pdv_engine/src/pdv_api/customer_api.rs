use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Customer, CustomerId, CustomerUpdate, MerchantId, NewCustomer},
    traits::{CustomerApiError, CustomerManagement},
};

pub struct CustomerApi<B> {
    db: B,
}

impl<B> Debug for CustomerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomerApi")
    }
}

impl<B> CustomerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CustomerApi<B>
where B: CustomerManagement
{
    pub async fn create_customer(
        &self,
        merchant_id: &MerchantId,
        customer: NewCustomer,
    ) -> Result<Customer, CustomerApiError> {
        let customer = validate_new_customer(customer)?;
        let customer = self.db.insert_customer(merchant_id, customer).await?;
        debug!("👤️ Customer {} ({}) created for {merchant_id}", customer.id, customer.name);
        Ok(customer)
    }

    pub async fn customer(&self, merchant_id: &MerchantId, customer_id: &CustomerId) -> Result<Customer, CustomerApiError> {
        self.db
            .fetch_customer(merchant_id, customer_id)
            .await?
            .ok_or_else(|| CustomerApiError::CustomerNotFound(customer_id.clone()))
    }

    pub async fn customers(&self, merchant_id: &MerchantId) -> Result<Vec<Customer>, CustomerApiError> {
        self.db.fetch_customers(merchant_id).await
    }

    pub async fn customer_by_chat_id(&self, merchant_id: &MerchantId, chat_id: &str) -> Result<Customer, CustomerApiError> {
        self.db
            .fetch_customer_by_chat_id(merchant_id, chat_id)
            .await?
            .ok_or_else(|| CustomerApiError::CustomerNotFound(CustomerId::from(format!("chat:{chat_id}"))))
    }

    /// Returns the customer behind `chat_id`, registering a new one called `name` on first contact.
    pub async fn find_or_create_by_chat_id(
        &self,
        merchant_id: &MerchantId,
        chat_id: &str,
        name: &str,
    ) -> Result<Customer, CustomerApiError> {
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return Err(CustomerApiError::InvalidInput("A chat id is required".into()));
        }
        let customer = validate_new_customer(NewCustomer::new(name).with_chat_id(chat_id))?;
        self.db.fetch_or_create_customer_by_chat_id(merchant_id, customer).await
    }

    pub async fn update_customer(
        &self,
        merchant_id: &MerchantId,
        customer_id: &CustomerId,
        mut update: CustomerUpdate,
    ) -> Result<Customer, CustomerApiError> {
        if let Some(name) = update.name.take() {
            update.name = Some(non_empty_name(&name)?);
        }
        if update.is_empty() {
            return self.customer(merchant_id, customer_id).await;
        }
        self.db
            .update_customer(merchant_id, customer_id, update)
            .await?
            .ok_or_else(|| CustomerApiError::CustomerNotFound(customer_id.clone()))
    }

    /// Deletes a customer. Customers that have placed orders are kept, so that the order history stays intact.
    pub async fn delete_customer(&self, merchant_id: &MerchantId, customer_id: &CustomerId) -> Result<(), CustomerApiError> {
        if self.db.delete_customer(merchant_id, customer_id).await? {
            debug!("👤️ Customer {customer_id} deleted from {merchant_id}");
            Ok(())
        } else {
            Err(CustomerApiError::CustomerNotFound(customer_id.clone()))
        }
    }
}

fn non_empty_name(name: &str) -> Result<String, CustomerApiError> {
    let name = name.trim();
    if name.is_empty() {
        Err(CustomerApiError::InvalidInput("Customer name cannot be empty".into()))
    } else {
        Ok(name.to_string())
    }
}

fn validate_new_customer(mut customer: NewCustomer) -> Result<NewCustomer, CustomerApiError> {
    customer.name = non_empty_name(&customer.name)?;
    customer.chat_id = customer.chat_id.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    Ok(customer)
}
