//! Webhook signature middleware for Actix Web.
//!
//! Payment providers sign every callback with the shared webhook secret (see
//! [`storefront_engine::helpers::WebhookVerifier`] for the exact scheme). This middleware reads the raw body, checks
//! the `X-Webhook-Timestamp` and `X-Webhook-Signature` headers against it, and only then lets the request through.
//!
//! On success the parsed body is attached to the request as a [`VerifiedWebhook`], which handlers extract with
//! `web::ReqData<VerifiedWebhook>`. A handler that receives one can trust that the payload came from a provider.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use serde_json::Value;
use storefront_engine::helpers::{WebhookVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

use crate::errors::ServerError;

/// A webhook body whose signature has been verified.
#[derive(Debug, Clone)]
pub struct VerifiedWebhook {
    pub timestamp: i64,
    pub body: Value,
}

pub struct WebhookSignatureFactory {
    verifier: WebhookVerifier,
}

impl WebhookSignatureFactory {
    pub fn new(verifier: WebhookVerifier) -> Self {
        WebhookSignatureFactory { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookSignatureFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookSignatureService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookSignatureService { verifier: self.verifier.clone(), service: Rc::new(service) }))
    }
}

pub struct WebhookSignatureService<S> {
    verifier: WebhookVerifier,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookSignatureService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature");
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract webhook body: {e:?}");
                ServerError::InvalidRequestBody("Failed to read webhook body".to_string())
            })?;
            let timestamp = header_value(&req, TIMESTAMP_HEADER);
            let signature = header_value(&req, SIGNATURE_HEADER);
            let body = verifier.verify(timestamp.as_deref(), signature.as_deref(), data.as_ref()).map_err(|e| {
                warn!("🔐️ Webhook rejected. {e}");
                ServerError::from(e)
            })?;
            // verify() has already parsed the timestamp successfully
            let timestamp = timestamp.and_then(|t| t.trim().parse::<i64>().ok()).unwrap_or_default();
            trace!("🔐️ Webhook signature check ✅️");
            req.extensions_mut().insert(VerifiedWebhook { timestamp, body });
            req.set_payload(bytes_to_payload(data));
            service.call(req).await
        })
    }
}

fn header_value(req: &ServiceRequest, name: &str) -> Option<String> {
    req.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
