use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{OrderId, Payment, PaymentProvider, PaymentStatus},
    sfe_api::errors::PaymentEventError,
};

pub const DEFAULT_TRANSACTION_PREFIX: &str = "TXN";

/// Provider status vocabulary, and the terminal payment status each word stands for. Matching is case-insensitive.
const STATUS_VOCABULARY: [(&str, PaymentStatus); 5] = [
    ("paid", PaymentStatus::Paid),
    ("success", PaymentStatus::Paid),
    ("failed", PaymentStatus::Failed),
    ("failure", PaymentStatus::Failed),
    ("fail", PaymentStatus::Failed),
];

/// Maps a provider's status word onto `paid` or `failed`. Anything outside the vocabulary is `None`.
pub fn normalize_provider_status(status: &str) -> Option<PaymentStatus> {
    let status = status.trim().to_ascii_lowercase();
    STATUS_VOCABULARY.iter().find(|(word, _)| *word == status).map(|(_, s)| *s)
}

/// A payment outcome reported by a provider, after its signature has been verified and its shape validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub transaction_id: String,
    pub order_id: OrderId,
    /// Always a terminal status
    pub outcome: PaymentStatus,
    pub provider: Option<PaymentProvider>,
}

impl PaymentEvent {
    /// Validates a verified webhook body. `transaction_prefix` is the prefix every provider reference must carry.
    pub fn from_json(body: &Value, transaction_prefix: &str) -> Result<Self, PaymentEventError> {
        let fields = body.as_object().ok_or(PaymentEventError::NotAnObject)?;
        let transaction_id = match fields.get("transaction_id") {
            Some(Value::String(s)) if s.len() > transaction_prefix.len() && s.starts_with(transaction_prefix) => {
                s.clone()
            },
            None | Some(Value::Null) => return Err(PaymentEventError::MissingField("transaction_id")),
            Some(other) => return Err(PaymentEventError::InvalidTransactionId(json_text(other))),
        };
        let order_id = match fields.get("order_id") {
            Some(Value::Number(n)) => {
                n.as_i64().map(OrderId::from).ok_or_else(|| PaymentEventError::InvalidOrderId(n.to_string()))?
            },
            Some(Value::String(s)) => s.parse::<OrderId>().map_err(|_| PaymentEventError::InvalidOrderId(s.clone()))?,
            None | Some(Value::Null) => return Err(PaymentEventError::MissingField("order_id")),
            Some(other) => return Err(PaymentEventError::InvalidOrderId(other.to_string())),
        };
        let outcome = match fields.get("status") {
            Some(Value::String(s)) => {
                normalize_provider_status(s).ok_or_else(|| PaymentEventError::UnknownStatus(s.clone()))?
            },
            None | Some(Value::Null) => return Err(PaymentEventError::MissingField("status")),
            Some(other) => return Err(PaymentEventError::UnknownStatus(other.to_string())),
        };
        let provider = match fields.get("provider") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => {
                Some(s.parse::<PaymentProvider>().map_err(|_| PaymentEventError::UnknownProvider(s.clone()))?)
            },
            Some(other) => return Err(PaymentEventError::UnknownProvider(other.to_string())),
        };
        Ok(Self { transaction_id, order_id, outcome, provider })
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// What happened to a verified webhook.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Processed(Payment),
    AlreadyProcessed(Payment),
}

impl WebhookOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            WebhookOutcome::Processed(p) | WebhookOutcome::AlreadyProcessed(p) => p,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            WebhookOutcome::Processed(_) => "Webhook processed",
            WebhookOutcome::AlreadyProcessed(_) => "Already processed",
        }
    }
}

/// A freshly created payment, and where to send the customer to complete it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub payment_id: i64,
    pub transaction_id: String,
    pub payment_url: String,
}

impl From<&Payment> for PaymentIntent {
    fn from(payment: &Payment) -> Self {
        let payment_url = format!("/mock-{}-pay/{}", payment.provider, payment.transaction_id);
        Self { payment_id: payment.id, transaction_id: payment.transaction_id.clone(), payment_url }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub id: i64,
    pub status: PaymentStatus,
}

impl From<&Payment> for PaymentStatusView {
    fn from(payment: &Payment) -> Self {
        Self { id: payment.id, status: payment.status }
    }
}
