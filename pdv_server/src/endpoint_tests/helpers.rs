use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use pdv_engine::db_types::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
    server::configure_extractors,
};

pub const MERCHANT: &str = "0b0a79b5-0d4e-4d55-9d5a-5d4f1c9a7e11";
pub const OTHER_MERCHANT: &str = "6f3a0a5e-23e3-4d5b-a5f4-0e6b3f2c8d90";

// A test-only signing secret. DO NOT re-use it anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-tests-signing-secret-0123456789")
}

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(&get_auth_config())
}

pub fn issue_token(merchant: &str) -> String {
    let claims = JwtClaims { merchant_id: MerchantId::from(merchant), email: "loja@exemplo.com".into() };
    issuer().issue_token(claims, None).expect("Failed to sign token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Runs a single request against an app built by `configure`, and returns the status and body.
/// Errors raised by middleware are rendered the same way actix would render them to a client.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(web::Data::new(issuer())).configure(configure_extractors).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = actix_web::body::to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, 0).unwrap()
}

pub fn product(id: &str, name: &str, price: i64, stock: i64) -> Product {
    Product {
        id: ProductId::from(id),
        merchant_id: MerchantId::from(MERCHANT),
        name: name.into(),
        description: None,
        price: Money::from(price),
        stock,
        category: Some("Salgados".into()),
        image_url: None,
        is_active: true,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn customer(id: &str, chat_id: &str, name: &str) -> Customer {
    Customer {
        id: CustomerId::from(id),
        merchant_id: MerchantId::from(MERCHANT),
        chat_id: Some(chat_id.into()),
        name: name.into(),
        phone: None,
        address: None,
        notes: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

/// An order built from `new`, the way the database would return it.
pub fn stored_order(new: &NewOrder, customer_name: Option<&str>, status: OrderStatusType) -> Order {
    Order {
        id: new.id.clone(),
        merchant_id: new.merchant_id.clone(),
        customer_id: new.customer_id.clone(),
        customer_name: customer_name.map(String::from),
        total: new.total,
        items: new.items.clone(),
        status,
        payment_method: new.payment_method,
        notes: new.notes.clone(),
        created_at: new.created_at,
        updated_at: new.created_at,
    }
}

pub fn order(id: &str, status: OrderStatusType) -> Order {
    Order {
        id: OrderId::from(id),
        merchant_id: MerchantId::from(MERCHANT),
        customer_id: CustomerId::from("c-ana"),
        customer_name: Some("Ana".into()),
        total: Money::from(1500),
        items: vec![
            LineItem::new(ProductId::from("p-coxinha"), "Coxinha", Money::from(500), 2),
            LineItem::new(ProductId::from("p-suco"), "Suco", Money::from(500), 1),
        ],
        status,
        payment_method: PaymentMethod::Pix,
        notes: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}
