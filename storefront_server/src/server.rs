use std::{sync::Arc, time::Duration};

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
    Resource,
};
use log::*;
use storefront_engine::{
    helpers::WebhookVerifier,
    traits::{OrderManagement, PaymentManagement, PermissionCapabilities},
    CartApi,
    CheckoutApi,
    OrderFlowApi,
    PaymentFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenVerifier,
    cleanup_worker::start_cleanup_worker,
    config::ServerConfig,
    errors::ServerError,
    middleware::WebhookSignatureFactory,
    routes::{
        health,
        payment_webhook,
        AddToCartRoute,
        CheckoutRoute,
        CreatePaymentRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PaymentStatusRoute,
        RemoveFromCartRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    match config.cleanup.interval {
        Some(period) => {
            // The worker runs for the lifetime of the process
            let _worker = start_cleanup_worker(db.clone(), config.cleanup.clone(), period);
        },
        None => warn!("🧹️ The cleanup worker is disabled. Stale carts and payments will accumulate."),
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let bind_address = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let access_log =
            if config.use_x_forwarded_for { "%t (%D ms) %s %{r}a %{Host}i %U" } else { "%t (%D ms) %s %a %{Host}i %U" };
        App::new()
            .wrap(Logger::new(access_log).log_target("sfg::access_log"))
            .configure(storefront_services(db.clone(), &config))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_address)?
    .run();
    Ok(srv)
}

/// Registers the engine APIs, the token verifier and every route against `db`.
pub fn storefront_services(db: SqliteDatabase, config: &ServerConfig) -> impl FnOnce(&mut ServiceConfig) {
    let checkout_api = CheckoutApi::new(db.clone(), config.max_attempts);
    let orders_api = OrderFlowApi::new(db.clone(), Arc::new(PermissionCapabilities), config.max_attempts);
    let payments_api = PaymentFlowApi::new(db.clone())
        .with_transaction_prefix(config.transaction_prefix.clone())
        .with_max_attempts(config.max_attempts);
    let cart_api = CartApi::new(db);
    let token_verifier = TokenVerifier::new(&config.auth);
    let webhook_verifier = WebhookVerifier::new(config.webhook.secret.clone(), config.webhook.tolerance);
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(json_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(token_verifier))
            .service(health)
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(webhook_resource::<SqliteDatabase>(webhook_verifier))
            .service(CreatePaymentRoute::<SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(RemoveFromCartRoute::<SqliteDatabase>::new());
    }
}

/// Malformed JSON bodies are reported in the same `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

/// `POST /payments/webhook`, behind signature verification. Any other method gets a `405`.
pub fn webhook_resource<B>(verifier: WebhookVerifier) -> Resource
where B: PaymentManagement + OrderManagement + 'static {
    web::resource("/payments/webhook")
        .name("payment_webhook")
        .route(web::post().to(payment_webhook::<B>).wrap(WebhookSignatureFactory::new(verifier)))
}
