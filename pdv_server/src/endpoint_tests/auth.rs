use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{DateTime, Utc};
use pdv_engine::{db_types::*, helpers::hash_password, traits::MerchantApiError, MerchantApi};
use serde_json::json;

use super::{
    helpers::{bearer, issue_token, issuer, send_request, timestamp, MERCHANT},
    mocks::MockMerchantManager,
};
use crate::{
    data_objects::AuthResponse,
    middleware::JwtAuthMiddlewareFactory,
    routes::{ChangePasswordRoute, LoginRoute, MyProfileRoute, RegisterRoute, UpdateProfileRoute},
};

fn configure(mock: MockMerchantManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(MerchantApi::new(mock)))
            .service(RegisterRoute::<MockMerchantManager>::new())
            .service(LoginRoute::<MockMerchantManager>::new())
            .service(
                web::scope("/api")
                    .wrap(JwtAuthMiddlewareFactory::new(issuer()))
                    .service(MyProfileRoute::<MockMerchantManager>::new())
                    .service(UpdateProfileRoute::<MockMerchantManager>::new())
                    .service(ChangePasswordRoute::<MockMerchantManager>::new()),
            );
    }
}

fn merchant(email: &str) -> Merchant {
    Merchant {
        id: MerchantId::from(MERCHANT),
        email: email.into(),
        name: "Pastelaria da Vila".into(),
        phone: None,
        created_at: timestamp(),
        updated_at: timestamp(),
        last_login_at: None,
    }
}

fn trial(ends: DateTime<Utc>) -> Subscription {
    Subscription {
        id: "sub-1".into(),
        merchant_id: MerchantId::from(MERCHANT),
        plan: Plan::Basic,
        status: SubscriptionStatus::Trialing,
        current_period_end: ends,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

fn credentials(password: &str) -> MerchantCredentials {
    MerchantCredentials { id: MerchantId::from(MERCHANT), password_hash: hash_password(password).unwrap() }
}

#[actix_web::test]
async fn register_issues_a_token() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_insert_merchant()
        .withf(|m, ends| {
            m.email == "loja@exemplo.com" && m.password_hash != "segredo123" && *ends > Utc::now() + chrono::Duration::days(13)
        })
        .times(1)
        .returning(|m, ends| Ok((merchant(&m.email), trial(ends))));
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "email": " Loja@Exemplo.com ",
        "password": "segredo123",
        "name": "Pastelaria da Vila"
    }));
    let (status, body) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let response: AuthResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.merchant.email, "loja@exemplo.com");
    let claims = issuer().validate_token(&response.access_token).unwrap();
    assert_eq!(claims.merchant_id.as_str(), MERCHANT);
}

#[actix_web::test]
async fn duplicate_emails_conflict() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_insert_merchant().returning(|m, _| Err(MerchantApiError::EmailAlreadyRegistered(m.email)));
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "email": "loja@exemplo.com",
        "password": "segredo123",
        "name": "Pastelaria da Vila"
    }));
    let (status, _) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn short_passwords_are_rejected() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_insert_merchant().never();
    let req = TestRequest::post().uri("/auth/register").set_json(json!({
        "email": "loja@exemplo.com",
        "password": "123",
        "name": "Pastelaria da Vila"
    }));
    let (status, body) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least 6 characters"), "{body}");
}

#[actix_web::test]
async fn login() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_fetch_credentials_by_email()
        .withf(|email| email == "loja@exemplo.com")
        .returning(|_| Ok(Some(credentials("segredo123"))));
    mock.expect_record_login().times(1).returning(|_| Ok(()));
    mock.expect_fetch_merchant().returning(|_| Ok(Some(merchant("loja@exemplo.com"))));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "LOJA@exemplo.com", "password": "segredo123"}));
    let (status, body) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: AuthResponse = serde_json::from_str(&body).unwrap();
    assert!(!response.access_token.is_empty());
}

#[actix_web::test]
async fn bad_credentials_are_indistinguishable() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_fetch_credentials_by_email().returning(|email| {
        Ok((email == "loja@exemplo.com").then(|| credentials("segredo123")))
    });
    mock.expect_record_login().never();
    let mock_config = configure(mock);
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "loja@exemplo.com", "password": "errada"}));
    let (wrong_password, wrong_password_body) = send_request(req, mock_config).await;

    let mut mock = MockMerchantManager::new();
    mock.expect_fetch_credentials_by_email().returning(|_| Ok(None));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "ninguem@exemplo.com", "password": "segredo123"}));
    let (unknown, unknown_body) = send_request(req, configure(mock)).await;

    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password_body, unknown_body);
}

#[actix_web::test]
async fn my_profile() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_fetch_merchant()
        .withf(|id| id.as_str() == MERCHANT)
        .returning(|_| Ok(Some(merchant("loja@exemplo.com"))));
    mock.expect_fetch_subscription().returning(|_| Ok(Some(trial(timestamp()))));
    let token = issue_token(MERCHANT);
    let req = TestRequest::get().uri("/api/me").insert_header(bearer(&token));
    let (status, body) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let profile: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(profile["merchant"]["name"], "Pastelaria da Vila");
    assert_eq!(profile["subscription"]["plan"], "BASIC");
    assert_eq!(profile["subscription"]["status"], "TRIALING");
}

#[actix_web::test]
async fn change_password_checks_the_old_one() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_fetch_credentials().returning(|_| Ok(Some(credentials("segredo123"))));
    mock.expect_update_password_hash().never();
    let token = issue_token(MERCHANT);
    let req = TestRequest::patch()
        .uri("/api/me/password")
        .insert_header(bearer(&token))
        .set_json(json!({"old_password": "errada", "new_password": "nova-senha"}));
    let (status, _) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut mock = MockMerchantManager::new();
    mock.expect_fetch_credentials().returning(|_| Ok(Some(credentials("segredo123"))));
    mock.expect_update_password_hash()
        .withf(|_, hash| pdv_engine::helpers::verify_password("nova-senha", hash))
        .times(1)
        .returning(|_, _| Ok(()));
    let req = TestRequest::patch()
        .uri("/api/me/password")
        .insert_header(bearer(&token))
        .set_json(json!({"old_password": "segredo123", "new_password": "nova-senha"}));
    let (status, body) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[actix_web::test]
async fn update_my_profile() {
    let _ = env_logger::try_init();
    let mut mock = MockMerchantManager::new();
    mock.expect_update_profile()
        .withf(|id, u| id.as_str() == MERCHANT && u.name.as_deref() == Some("Pastelaria Nova") && u.phone.is_none())
        .times(1)
        .returning(|_, u| {
            let mut m = merchant("loja@exemplo.com");
            m.name = u.name.unwrap_or_default();
            Ok(Some(m))
        });
    let token = issue_token(MERCHANT);
    let req = TestRequest::patch()
        .uri("/api/me")
        .insert_header(bearer(&token))
        .set_json(json!({"name": " Pastelaria Nova  "}));
    let (status, body) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated: Merchant = serde_json::from_str(&body).unwrap();
    assert_eq!(updated.name, "Pastelaria Nova");
    assert_eq!(updated.email, "loja@exemplo.com");

    let mut mock = MockMerchantManager::new();
    mock.expect_update_profile().never();
    let req = TestRequest::patch().uri("/api/me").insert_header(bearer(&token)).set_json(json!({"name": "  "}));
    let (status, _) = send_request(req, configure(mock)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::patch().uri("/api/me").set_json(json!({"name": "Sem token"}));
    let (status, _) = send_request(req, configure(MockMerchantManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
