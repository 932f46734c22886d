//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into the engine API. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database call in the engine is async, so handlers must
//! always `.await` them rather than block on them.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use storefront_engine::{
    db_types::{OrderId, ProductId},
    order_objects::{CartLineView, CartView, CheckoutReceipt, OrderStatusView, OrderView},
    payment_objects::{PaymentIntent, PaymentStatusView},
    traits::{CartManagement, InventoryManagement, OrderManagement, PaymentManagement},
    CartApi,
    CheckoutApi,
    OrderFlowApi,
    PaymentFlowApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{CartItemParams, NewPaymentParams, StatusUpdateParams, WebhookResponse},
    errors::ServerError,
    middleware::VerifiedWebhook,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds+)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

fn parse_order_id(raw: &str) -> Result<OrderId, ServerError> {
    raw.parse::<OrderId>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(checkout => Post "/orders" impl OrderManagement);
/// Checks out the caller's cart. There is no request body: the cart is the order.
///
/// Responds with `201` and `{id, total, items}`, or `400` if the cart is empty or a product is short of stock.
pub async fn checkout<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Checkout request for user {}", claims.user_id());
    let snapshot = api.checkout(claims.user_id()).await?;
    Ok(HttpResponse::Created().json(CheckoutReceipt::from(snapshot)))
}

route!(my_orders => Get "/orders" impl OrderManagement);
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user {}", claims.user_id());
    let orders = api.orders_for_user(claims.user_id()).await?;
    let orders = orders.into_iter().map(OrderView::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
/// Owners can read their own orders. Anyone else needs the `view_order` permission, and gets a `404` without it.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(&path.into_inner())?;
    debug!("💻️ GET order {order_id} for user {}", claims.user_id());
    let snapshot = api.order_for_actor(&claims.actor(), order_id).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(snapshot)))
}

route!(update_order_status => Patch "/orders/{id}/status" impl OrderManagement);
/// Moves an order one step along `pending → paid → shipped → completed`. Requires the `update_order_status`
/// permission (or staff).
pub async fn update_order_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<StatusUpdateParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(&path.into_inner())?;
    let StatusUpdateParams { status } = body.into_inner();
    info!("💻️ User {} wants to move order {order_id} to {status}", claims.user_id());
    let snapshot = api.update_status_str(&claims.actor(), order_id, &status).await?;
    Ok(HttpResponse::Ok().json(OrderStatusView { id: snapshot.order.id, status: snapshot.order.status }))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payments" impl PaymentManagement, OrderManagement);
/// Creates a pending payment for the full total of one of the caller's orders.
///
/// Responds with `201` and `{payment_id, transaction_id, payment_url}`.
pub async fn create_payment<B>(
    claims: JwtClaims,
    body: web::Json<NewPaymentParams>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement + OrderManagement,
{
    let NewPaymentParams { order_id, provider } = body.into_inner();
    debug!("💻️ User {} requested a {provider} payment for order {order_id}", claims.user_id());
    let intent: PaymentIntent = api.create_payment(claims.user_id(), order_id, &provider).await?;
    Ok(HttpResponse::Created().json(intent))
}

route!(payment_status => Get "/payments/{id}/status" impl PaymentManagement, OrderManagement);
pub async fn payment_status<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement + OrderManagement,
{
    let raw = path.into_inner();
    let payment_id =
        raw.trim().parse::<i64>().map_err(|_| ServerError::InvalidRequestPath(format!("Invalid payment id: {raw}")))?;
    let payment = api.payment_for_user(claims.user_id(), payment_id).await?;
    Ok(HttpResponse::Ok().json(PaymentStatusView::from(&payment)))
}

/// The payment provider callback. This route is not authenticated with an access token. Instead it MUST be wrapped
/// in [`crate::middleware::WebhookSignatureFactory`], which supplies the verified body.
///
/// Both a freshly applied event and a redelivery of one that was already applied get a `200`.
pub async fn payment_webhook<B>(
    webhook: web::ReqData<VerifiedWebhook>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement + OrderManagement,
{
    let webhook = webhook.into_inner();
    trace!("💻️ Verified webhook signed at {}", webhook.timestamp);
    let outcome = api.process_webhook(&webhook.body).await.map_err(ServerError::WebhookRejected)?;
    Ok(HttpResponse::Ok().json(WebhookResponse::from(&outcome)))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement, InventoryManagement);
pub async fn my_cart<B>(claims: JwtClaims, api: web::Data<CartApi<B>>) -> Result<HttpResponse, ServerError>
where B: CartManagement + InventoryManagement {
    let cart: CartView = api.cart(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_to_cart => Post "/cart" impl CartManagement, InventoryManagement);
/// Sets the quantity of a product in the caller's cart. Stock is not checked until checkout.
pub async fn add_to_cart<B>(
    claims: JwtClaims,
    body: web::Json<CartItemParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + InventoryManagement,
{
    let CartItemParams { product_id, quantity } = body.into_inner();
    let line = api.set_item(claims.user_id(), product_id, quantity).await?;
    Ok(HttpResponse::Created().json(CartLineView::from(line)))
}

route!(remove_from_cart => Delete "/cart/{product_id}" impl CartManagement, InventoryManagement);
pub async fn remove_from_cart<B>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CartManagement + InventoryManagement,
{
    let raw = path.into_inner();
    let product_id = raw
        .trim()
        .parse::<ProductId>()
        .map_err(|_| ServerError::InvalidRequestPath(format!("Invalid product id: {raw}")))?;
    api.remove_item(claims.user_id(), product_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
