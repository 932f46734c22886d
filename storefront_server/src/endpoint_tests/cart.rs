use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use serde_json::json;
use storefront_engine::{
    db_types::{Amount, Product},
    CartApi,
};

use super::{
    helpers::{bearer, error_message, json, send_request, shopper_token},
    mocks::{cart_line, MockStore},
};
use crate::routes::{AddToCartRoute, MyCartRoute, RemoveFromCartRoute};

fn cart_routes(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(CartApi::new(store)))
            .service(MyCartRoute::<MockStore>::new())
            .service(AddToCartRoute::<MockStore>::new())
            .service(RemoveFromCartRoute::<MockStore>::new());
    }
}

fn mug(id: i64) -> Product {
    let now = Utc::now();
    Product { id, name: "Ceramic mug".to_string(), price: Amount::from(100), stock: 5, created_at: now, updated_at: now }
}

#[actix_web::test]
async fn view_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_cart_items().withf(|user| *user == 4).returning(|_| Ok(vec![cart_line(3, 2)]));
    let req = TestRequest::get().uri("/cart").insert_header(bearer(&shopper_token(4)));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        json!({
            "items": [{"product_id": 3, "product_name": "Ceramic mug", "price": 100, "quantity": 2}],
            "total": 200
        })
    );
}

#[actix_web::test]
async fn add_to_cart_beyond_stock() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_product().returning(|id| Ok(Some(mug(id))));
    store
        .expect_set_cart_item()
        .withf(|user, product, qty| *user == 4 && *product == 3 && *qty == 9)
        .times(1)
        .returning(|_, product, qty| Ok(cart_line(product, qty)));
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(bearer(&shopper_token(4)))
        .set_json(json!({"product_id": 3, "quantity": 9}));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["quantity"], 9);
}

#[actix_web::test]
async fn invalid_cart_edits() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_set_cart_item().never();
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(bearer(&shopper_token(4)))
        .set_json(json!({"product_id": 3, "quantity": 0}));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Quantity must be a positive integer");

    let mut store = MockStore::new();
    store.expect_fetch_product().returning(|_| Ok(None));
    store.expect_set_cart_item().never();
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(bearer(&shopper_token(4)))
        .set_json(json!({"product_id": 30, "quantity": 1}));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Product 30 not found");
}

#[actix_web::test]
async fn cart_amounts_that_cannot_be_represented() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_product().returning(|id| Ok(Some(mug(id))));
    store.expect_set_cart_item().never();
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(bearer(&shopper_token(4)))
        .set_json(json!({"product_id": 3, "quantity": i64::MAX / 10}));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Quantity is too large");

    let mut store = MockStore::new();
    store.expect_fetch_cart_items().returning(|_| Ok(vec![cart_line(3, i64::MAX / 150), cart_line(5, i64::MAX / 150)]));
    let req = TestRequest::get().uri("/cart").insert_header(bearer(&shopper_token(4)));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Cart total is too large");
}

#[actix_web::test]
async fn remove_from_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_remove_cart_item().withf(|user, product| *user == 4 && *product == 3).returning(|_, _| Ok(true));
    let req = TestRequest::delete().uri("/cart/3").insert_header(bearer(&shopper_token(4)));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let mut store = MockStore::new();
    store.expect_remove_cart_item().returning(|_, _| Ok(false));
    let req = TestRequest::delete().uri("/cart/3").insert_header(bearer(&shopper_token(4)));
    let (status, body) = send_request(req, cart_routes(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Product 3 is not in the cart");
}
