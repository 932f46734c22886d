use serde::{Deserialize, Serialize};
use storefront_engine::{
    db_types::{OrderId, PaymentStatus, ProductId},
    payment_objects::WebhookOutcome,
};

/// What a payment provider gets back from a webhook that was accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub message: String,
    pub payment_id: i64,
    pub status: PaymentStatus,
}

impl From<&WebhookOutcome> for WebhookResponse {
    fn from(outcome: &WebhookOutcome) -> Self {
        let payment = outcome.payment();
        Self { message: outcome.message().to_string(), payment_id: payment.id, status: payment.status }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateParams {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentParams {
    pub order_id: OrderId,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemParams {
    pub product_id: ProductId,
    pub quantity: i64,
}
