use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use serde_json::json;
use storefront_engine::{
    db_types::{NewPayment, OrderId, OrderStatusType, Payment, PaymentStatus},
    PaymentFlowApi,
};

use super::{
    helpers::{bearer, error_message, json, send_request, shopper_token},
    mocks::{order, payment, MockStore},
};
use crate::routes::{CreatePaymentRoute, PaymentStatusRoute};

fn payment_routes(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(PaymentFlowApi::new(store)))
            .service(CreatePaymentRoute::<MockStore>::new())
            .service(PaymentStatusRoute::<MockStore>::new());
    }
}

fn new_payment(token: &str, order_id: i64, provider: &str) -> TestRequest {
    TestRequest::post()
        .uri("/payments")
        .insert_header(bearer(token))
        .set_json(json!({ "order_id": order_id, "provider": provider }))
}

fn stored(p: NewPayment) -> Payment {
    let now = Utc::now();
    Payment {
        id: 11,
        order_id: p.order_id,
        provider: p.provider,
        amount: p.amount,
        status: PaymentStatus::Pending,
        transaction_id: p.transaction_id,
        provider_assigned: false,
        created_at: now,
        updated_at: now,
    }
}

#[actix_web::test]
async fn create_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 1, OrderStatusType::Pending))));
    store
        .expect_insert_payment()
        .withf(|p| p.order_id == OrderId(7) && p.amount.value() == 400 && p.transaction_id.starts_with("TXN"))
        .times(1)
        .returning(|p| Ok(stored(p)));
    let (status, body) = send_request(new_payment(&shopper_token(1), 7, "VNPay"), payment_routes(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    let intent = json(&body);
    assert_eq!(intent["payment_id"], 11);
    let txid = intent["transaction_id"].as_str().expect("transaction_id is missing");
    assert!(txid.starts_with("TXN"));
    assert_eq!(intent["payment_url"], format!("/mock-vnpay-pay/{txid}"));
}

#[actix_web::test]
async fn unsupported_providers_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().never();
    store.expect_insert_payment().never();
    let (status, body) = send_request(new_payment(&shopper_token(1), 7, "paypal"), payment_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid provider: paypal");
}

#[actix_web::test]
async fn payments_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 1, OrderStatusType::Pending))));
    store.expect_insert_payment().never();
    let (status, body) = send_request(new_payment(&shopper_token(2), 7, "momo"), payment_routes(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Order not found");

    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    let (status, _) = send_request(new_payment(&shopper_token(2), 70, "momo"), payment_routes(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn paid_orders_get_no_new_payments() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 1, OrderStatusType::Paid))));
    store.expect_insert_payment().never();
    let (status, body) = send_request(new_payment(&shopper_token(1), 7, "momo"), payment_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Order already paid");
}

#[actix_web::test]
async fn poll_payment_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|id| Ok(Some(payment(id, 7, PaymentStatus::Paid))));
    store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 1, OrderStatusType::Paid))));
    let req = TestRequest::get().uri("/payments/11/status").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, payment_routes(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"id": 11, "status": "paid"}));
}

#[actix_web::test]
async fn payment_status_is_private() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|id| Ok(Some(payment(id, 7, PaymentStatus::Pending))));
    store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 1, OrderStatusType::Pending))));
    let req = TestRequest::get().uri("/payments/11/status").insert_header(bearer(&shopper_token(2)));
    let (status, body) = send_request(req, payment_routes(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Payment not found");

    let req = TestRequest::get().uri("/payments/eleven/status").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, payment_routes(MockStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Could not read request path: Invalid payment id: eleven");
}
