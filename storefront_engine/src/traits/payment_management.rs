use chrono::Duration;

use crate::{
    db_types::{NewPayment, OrderId, Payment},
    payment_objects::PaymentEvent,
    traits::{FulfillmentError, ReconcileOutcome},
};

#[allow(async_fn_in_trait)]
pub trait PaymentManagement {
    /// Stores a new, pending payment intent for an order. The transaction id is a locally minted reference that the
    /// provider may later replace with its own.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, FulfillmentError>;

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, FulfillmentError>;

    async fn fetch_payment_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>, FulfillmentError>;

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, FulfillmentError>;

    /// Applies a verified provider event, in one transaction.
    ///
    /// 1. The payment is located by transaction id. Failing that, the oldest pending payment of the order that has not
    ///    yet been bound to a provider reference adopts the transaction id. Failing that, a new pending payment is
    ///    created for the order total.
    /// 2. If the payment is already in the asserted terminal status, nothing changes and
    ///    [`ReconcileOutcome::AlreadyProcessed`] is returned.
    /// 3. If it is in the other terminal status, the event is rejected as a conflict.
    /// 4. Otherwise the payment takes the new status. A `paid` outcome also moves a `pending` order to `paid`.
    ///
    /// Every rejection rolls back, so a payment and its order are never seen in an inconsistent state.
    async fn reconcile_payment_event(&self, event: &PaymentEvent) -> Result<ReconcileOutcome, FulfillmentError>;

    /// Marks pending payments created more than `older_than` ago as `failed`, returning the affected payments.
    async fn expire_pending_payments(&self, older_than: Duration) -> Result<Vec<Payment>, FulfillmentError>;
}
