use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use serde_json::json;
use storefront_engine::{
    db_types::{OrderId, OrderStatusType},
    traits::{
        CheckoutRejection,
        CheckoutResult,
        FulfillmentError,
        OrderSnapshot,
        OrderTransition,
        PermissionCapabilities,
    },
    CheckoutApi,
    OrderFlowApi,
};

use super::{
    helpers::{bearer, error_message, issue_token, json, send_request, shopper_token, staff_token},
    mocks::{order, order_items, MockStore},
};
use crate::routes::{CheckoutRoute, MyOrdersRoute, OrderByIdRoute, UpdateOrderStatusRoute};

fn checkout_routes(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(CheckoutApi::new(store, 3))).service(CheckoutRoute::<MockStore>::new());
    }
}

fn order_routes(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = OrderFlowApi::new(store, Arc::new(PermissionCapabilities), 3);
        cfg.app_data(web::Data::new(api))
            .service(MyOrdersRoute::<MockStore>::new())
            .service(OrderByIdRoute::<MockStore>::new())
            .service(UpdateOrderStatusRoute::<MockStore>::new());
    }
}

fn status_update(order_id: i64, token: &str, status: &str) -> TestRequest {
    TestRequest::patch()
        .uri(&format!("/orders/{order_id}/status"))
        .insert_header(bearer(token))
        .set_json(json!({ "status": status }))
}

#[actix_web::test]
async fn fetch_my_orders_without_a_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_orders_for_user().never();
    let (status, body) = send_request(TestRequest::get().uri("/orders"), order_routes(store)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "Authentication Error. No access token was provided.");
}

#[actix_web::test]
async fn fetch_my_orders_with_bad_tokens() {
    let _ = env_logger::try_init().ok();
    let expired = issue_token(1, false, &[], Utc::now() - Duration::hours(2));
    let req = TestRequest::get().uri("/orders").insert_header(bearer(&expired));
    let (status, _) = send_request(req, order_routes(MockStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri("/orders").insert_header(("Authorization", "Token abc"));
    let (status, body) = send_request(req, order_routes(MockStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("Bearer"));

    let mut token = shopper_token(1);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let req = TestRequest::get().uri("/orders").insert_header(bearer(&token));
    let (status, _) = send_request(req, order_routes(MockStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_orders_for_user().withf(|user| *user == 1).returning(|_| {
        Ok(vec![order(8, 1, OrderStatusType::Paid), order(7, 1, OrderStatusType::Pending)])
    });
    store.expect_fetch_order_items().returning(|id| Ok(order_items(id.value())));
    let req = TestRequest::get().uri("/orders").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, order_routes(store)).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json(&body);
    assert_eq!(orders.as_array().map(Vec::len), Some(2));
    assert_eq!(orders[0]["id"], 8);
    assert_eq!(orders[0]["status"], "paid");
    assert_eq!(orders[1]["total"], 400);
    assert_eq!(orders[1]["items"][0], json!({"product_name": "Ceramic mug", "price": 100, "quantity": 3}));
}

#[actix_web::test]
async fn checkout_places_an_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_checkout_cart().withf(|user| *user == 1).times(1).returning(|_| {
        Ok(CheckoutResult::Placed(OrderSnapshot::new(order(7, 1, OrderStatusType::Pending), order_items(7))))
    });
    let req = TestRequest::post().uri("/orders").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, checkout_routes(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        json(&body),
        json!({
            "id": 7,
            "total": 400,
            "items": [
                {"product_name": "Ceramic mug", "price": 100, "quantity": 3},
                {"product_name": "Coaster", "price": 50, "quantity": 2}
            ]
        })
    );
}

#[actix_web::test]
async fn checkout_rejections() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_checkout_cart().returning(|_| Ok(CheckoutResult::Rejected(CheckoutRejection::CartEmpty)));
    let req = TestRequest::post().uri("/orders").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, checkout_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Cart is empty");

    let mut store = MockStore::new();
    store.expect_checkout_cart().returning(|_| {
        Ok(CheckoutResult::Rejected(CheckoutRejection::InsufficientStock {
            product_id: 3,
            product_name: "Ceramic mug".to_string(),
            requested: 3,
            available: 2,
        }))
    });
    let req = TestRequest::post().uri("/orders").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, checkout_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Not enough stock for Ceramic mug");

    let mut store = MockStore::new();
    store.expect_checkout_cart().returning(|_| Ok(CheckoutResult::Rejected(CheckoutRejection::TotalTooLarge)));
    let req = TestRequest::post().uri("/orders").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, checkout_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Order total is too large");
}

#[actix_web::test]
async fn checkout_under_lock_contention() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_checkout_cart()
        .times(3)
        .returning(|_| Err(FulfillmentError::Transient("database is locked".to_string())));
    let req = TestRequest::post().uri("/orders").insert_header(bearer(&shopper_token(1)));
    let (status, body) = send_request(req, checkout_routes(store)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_message(&body), "Checkout could not be completed right now. Please try again.");
}

#[actix_web::test]
async fn shoppers_cannot_update_order_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_advance_order_status().never();
    store.expect_fetch_order().never();
    let (status, body) = send_request(status_update(7, &shopper_token(1), "paid"), order_routes(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "Permission denied. update_order_status is required.");
}

#[actix_web::test]
async fn staff_update_order_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_advance_order_status()
        .withf(|id, status| *id == OrderId(7) && *status == OrderStatusType::Paid)
        .times(1)
        .returning(|_, _| Ok(OrderTransition::Advanced(order(7, 1, OrderStatusType::Paid))));
    store.expect_fetch_order_items().returning(|id| Ok(order_items(id.value())));
    let (status, body) = send_request(status_update(7, &staff_token(99), "paid"), order_routes(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"id": 7, "status": "paid"}));
}

#[actix_web::test]
async fn the_update_permission_is_enough() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_advance_order_status()
        .returning(|_, _| Ok(OrderTransition::Advanced(order(7, 1, OrderStatusType::Shipped))));
    store.expect_fetch_order_items().returning(|id| Ok(order_items(id.value())));
    let token = issue_token(42, false, &["update_order_status"], Utc::now() + Duration::hours(1));
    let (status, body) = send_request(status_update(7, &token, "SHIPPED"), order_routes(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "shipped");
}

#[actix_web::test]
async fn invalid_status_updates() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_advance_order_status()
        .returning(|_, _| Ok(OrderTransition::AlreadyCompleted(order(7, 1, OrderStatusType::Completed))));
    let (status, body) = send_request(status_update(7, &staff_token(99), "completed"), order_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Order already completed");

    let mut store = MockStore::new();
    store.expect_advance_order_status().returning(|_, requested| {
        Ok(OrderTransition::Rejected { current: OrderStatusType::Pending, requested })
    });
    let (status, body) = send_request(status_update(7, &staff_token(99), "shipped"), order_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid status transition from pending to shipped");

    let mut store = MockStore::new();
    store.expect_advance_order_status().never();
    let (status, body) = send_request(status_update(7, &staff_token(99), "teleported"), order_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid status: teleported");

    let mut store = MockStore::new();
    store.expect_advance_order_status().returning(|id, _| Err(FulfillmentError::OrderNotFound(id)));
    let (status, _) = send_request(status_update(404, &staff_token(99), "paid"), order_routes(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_status_update_bodies() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::patch()
        .uri("/orders/7/status")
        .insert_header(bearer(&staff_token(99)))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"status\": ");
    let (status, body) = send_request(req, order_routes(MockStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Could not read request body"));

    let req = TestRequest::patch()
        .uri("/orders/seven/status")
        .insert_header(bearer(&staff_token(99)))
        .set_json(json!({"status": "paid"}));
    let (status, body) = send_request(req, order_routes(MockStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Could not read request path: Invalid value: Invalid order id: seven");
}

#[actix_web::test]
async fn orders_are_private() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 1, OrderStatusType::Pending))));
    store.expect_fetch_order_items().never();
    let req = TestRequest::get().uri("/orders/7").insert_header(bearer(&shopper_token(2)));
    let (status, body) = send_request(req, order_routes(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Order #7 not found");
}

#[actix_web::test]
async fn owners_and_privileged_readers_see_orders() {
    let _ = env_logger::try_init().ok();
    for token in [shopper_token(1), issue_token(2, false, &["view_order"], Utc::now() + Duration::hours(1))] {
        let mut store = MockStore::new();
        store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 1, OrderStatusType::Shipped))));
        store.expect_fetch_order_items().returning(|id| Ok(order_items(id.value())));
        let req = TestRequest::get().uri("/orders/7").insert_header(bearer(&token));
        let (status, body) = send_request(req, order_routes(store)).await;
        assert_eq!(status, StatusCode::OK);
        let view = json(&body);
        assert_eq!(view["id"], 7);
        assert_eq!(view["status"], "shipped");
        assert_eq!(view["items"].as_array().map(Vec::len), Some(2));
    }
}
