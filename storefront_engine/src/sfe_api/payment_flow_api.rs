use std::fmt::Debug;

use chrono::Duration;
use log::*;
use serde_json::Value;

use crate::{
    db_types::{NewPayment, OrderId, OrderStatusType, Payment, PaymentProvider, UserId},
    helpers::new_transaction_id,
    sfe_api::{
        errors::PaymentFlowError,
        payment_objects::{PaymentEvent, PaymentIntent, WebhookOutcome, DEFAULT_TRANSACTION_PREFIX},
        retry::retry_transient,
    },
    traits::{OrderManagement, PaymentManagement, ReconcileOutcome, ReconcileRejection},
};

/// `PaymentFlowApi` creates payment intents for orders, and applies provider webhooks to payments and orders.
///
/// Webhook bodies reaching [`Self::process_webhook`] must already have passed signature verification.
pub struct PaymentFlowApi<B> {
    db: B,
    transaction_prefix: String,
    max_attempts: u32,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi ({})", self.transaction_prefix)
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, transaction_prefix: DEFAULT_TRANSACTION_PREFIX.to_string(), max_attempts: 3 }
    }

    pub fn with_transaction_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.transaction_prefix = prefix.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentManagement + OrderManagement
{
    /// Creates a pending payment for the full order total.
    ///
    /// ## Failure modes:
    /// - The provider is not one of the supported providers.
    /// - The order does not exist, or belongs to someone else. These are indistinguishable to the caller.
    /// - The order is no longer `pending`.
    pub async fn create_payment(
        &self,
        user_id: UserId,
        order_id: OrderId,
        provider: &str,
    ) -> Result<PaymentIntent, PaymentFlowError> {
        let provider = provider
            .trim()
            .to_ascii_lowercase()
            .parse::<PaymentProvider>()
            .map_err(|_| PaymentFlowError::InvalidProvider(provider.to_string()))?;
        let order = match self.db.fetch_order(order_id).await? {
            Some(o) if o.user_id == user_id => o,
            _ => {
                debug!("💳️ User {user_id} requested a payment for order {order_id}, which they do not own");
                return Err(PaymentFlowError::OrderNotFound);
            },
        };
        if order.status != OrderStatusType::Pending {
            debug!("💳️ Order {order_id} is already {}. No new payment will be created", order.status);
            return Err(PaymentFlowError::OrderAlreadyPaid);
        }
        let transaction_id = new_transaction_id(&self.transaction_prefix);
        let payment = self.db.insert_payment(NewPayment::new(order.id, provider, order.total, transaction_id)).await?;
        info!("💳️ Payment #{} [{}] created for order {order_id} via {provider}", payment.id, payment.transaction_id);
        Ok(PaymentIntent::from(&payment))
    }

    /// Validates a verified webhook body and reconciles it against the stored payment and order.
    ///
    /// Delivering the same event twice is safe: the second delivery returns [`WebhookOutcome::AlreadyProcessed`]
    /// and changes nothing. An event that contradicts a terminal payment status is rejected as a conflict.
    pub async fn process_webhook(&self, body: &Value) -> Result<WebhookOutcome, PaymentFlowError> {
        let event = PaymentEvent::from_json(body, &self.transaction_prefix).map_err(|e| {
            debug!("🪝️ Rejecting webhook body: {e}");
            e
        })?;
        self.process_event(&event).await
    }

    pub async fn process_event(&self, event: &PaymentEvent) -> Result<WebhookOutcome, PaymentFlowError> {
        let txid = event.transaction_id.as_str();
        trace!("🪝️ Reconciling [{txid}] for order {} as {}", event.order_id, event.outcome);
        let outcome =
            retry_transient("webhook", self.max_attempts, || self.db.reconcile_payment_event(event)).await?;
        match outcome {
            ReconcileOutcome::Applied(payment) => {
                info!("🪝️ Payment #{} [{txid}] is now {}", payment.id, payment.status);
                Ok(WebhookOutcome::Processed(payment))
            },
            ReconcileOutcome::AlreadyProcessed(payment) => {
                debug!("🪝️ [{txid}] is already {}. Nothing to do", payment.status);
                Ok(WebhookOutcome::AlreadyProcessed(payment))
            },
            ReconcileOutcome::Rejected(rejection) => {
                warn!("🪝️ Webhook for [{txid}] rejected: {rejection:?}");
                Err(match rejection {
                    ReconcileRejection::OrderNotFound => PaymentFlowError::OrderNotFound,
                    ReconcileRejection::TransactionOrderMismatch => PaymentFlowError::TransactionOrderMismatch,
                    ReconcileRejection::ProviderRequired => PaymentFlowError::ProviderRequired,
                    ReconcileRejection::Conflict { current, requested } => {
                        PaymentFlowError::Conflict { current, requested }
                    },
                    ReconcileRejection::OrderAlreadySettled => PaymentFlowError::OrderAlreadySettled,
                })
            },
        }
    }

    /// Fetches a payment on behalf of the owner of the order it pays for. Anyone else is told it does not exist.
    pub async fn payment_for_user(&self, user_id: UserId, payment_id: i64) -> Result<Payment, PaymentFlowError> {
        let payment = self.db.fetch_payment(payment_id).await?.ok_or(PaymentFlowError::PaymentNotFound)?;
        let owner = self.db.fetch_order(payment.order_id).await?.map(|o| o.user_id);
        if owner != Some(user_id) {
            debug!("💳️ User {user_id} asked for payment #{payment_id}, which they do not own");
            return Err(PaymentFlowError::PaymentNotFound);
        }
        Ok(payment)
    }

    /// Fails every payment that has been pending for longer than `older_than`.
    pub async fn expire_stale_payments(&self, older_than: Duration) -> Result<Vec<Payment>, PaymentFlowError> {
        let expired = self.db.expire_pending_payments(older_than).await?;
        if !expired.is_empty() {
            info!("💳️ {} stale pending payments marked as failed", expired.len());
        }
        Ok(expired)
    }
}
