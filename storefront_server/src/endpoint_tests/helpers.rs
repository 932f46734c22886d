use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
    Error,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;
use serde_json::Value;
use sfg_common::Secret;
use storefront_engine::{
    db_types::UserId,
    helpers::{WebhookVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};

use crate::{
    auth::{JwtClaims, TokenVerifier},
    config::{AuthConfig, WebhookConfig},
    server::json_config,
};

// Test-only secrets. DO NOT re-use these anywhere.
const TEST_JWT_SECRET: &str = "0b7f0c1e6fd7d7f1b8f3b1f2a6e9d1c4b5a0c3e2f1d4a7b6c9e8f2a1b4c7d0e3";
const TEST_WEBHOOK_SECRET: &str = "whsec_4e1c7a9b2d5f8e0a3c6b9d2f5e8a1c4b";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn webhook_config() -> WebhookConfig {
    WebhookConfig { secret: Secret::new(TEST_WEBHOOK_SECRET.to_string()), tolerance: Duration::seconds(300) }
}

pub fn webhook_verifier() -> WebhookVerifier {
    let config = webhook_config();
    WebhookVerifier::new(config.secret, config.tolerance)
}

pub fn issue_token(user_id: UserId, is_staff: bool, permissions: &[&str], expiry: DateTime<Utc>) -> String {
    let claims = JwtClaims {
        sub: user_id,
        is_staff,
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        exp: expiry.timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("Failed to sign token")
}

/// A day-long token for an ordinary shopper.
pub fn shopper_token(user_id: UserId) -> String {
    issue_token(user_id, false, &[], Utc::now() + Duration::days(1))
}

pub fn staff_token(user_id: UserId) -> String {
    issue_token(user_id, true, &[], Utc::now() + Duration::days(1))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Attaches freshly signed webhook headers to `req`.
pub fn signed_webhook(body: &Value, signed_at: DateTime<Utc>) -> TestRequest {
    let signature = webhook_verifier().sign(signed_at.timestamp(), body).expect("Failed to sign webhook");
    TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((TIMESTAMP_HEADER, signed_at.timestamp().to_string()))
        .insert_header((SIGNATURE_HEADER, signature))
        .set_payload(body.to_string())
}

/// Sends `req` to an app built from `configure`, with the test token verifier installed.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::Data::new(TokenVerifier::new(&get_auth_config())))
        .app_data(json_config())
        .configure(configure);
    let service = test::init_service(app).await;
    call(&service, req).await
}

/// Errors raised by middleware are rendered into responses, the same way the HTTP server would.
pub async fn call<S, B>(service: &S, req: TestRequest) -> (StatusCode, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    debug!("Making request");
    match test::try_call_service(service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}

pub fn error_message(body: &str) -> String {
    json(body)["error"].as_str().map(str::to_string).unwrap_or_else(|| panic!("No error message in {body}"))
}
