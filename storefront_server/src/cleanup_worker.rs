use log::*;
use storefront_engine::{
    db_types::CartPurgeResult,
    traits::{CartManagement, InventoryManagement, OrderManagement, PaymentManagement},
    CartApi,
    PaymentFlowApi,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::config::CleanupConfig;

#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    /// `None` if the cart purge failed
    pub carts: Option<CartPurgeResult>,
    /// The number of pending payments that were failed, or `None` if the expiry failed
    pub expired_payments: Option<usize>,
}

/// Starts the cleanup worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_cleanup_worker(db: SqliteDatabase, config: CleanupConfig, period: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        let carts = CartApi::new(db.clone());
        let payments = PaymentFlowApi::new(db);
        info!("🧹️ Stale data cleanup worker started. Running every {}s", period.as_secs());
        loop {
            timer.tick().await;
            info!("🧹️ Running stale data cleanup job");
            let report = run_cleanup(&carts, &payments, &config).await;
            debug!("🧹️ Cleanup complete: {report:?}");
        }
    })
}

/// One pass of the cleanup job. A failure in one half does not stop the other.
pub async fn run_cleanup<B>(carts: &CartApi<B>, payments: &PaymentFlowApi<B>, config: &CleanupConfig) -> CleanupReport
where B: CartManagement + InventoryManagement + PaymentManagement + OrderManagement {
    let carts = match carts.purge_stale_carts(config.cart_age, config.delete_empty_carts).await {
        Ok(result) => {
            info!("🧹️ {} stale cart items removed, {} carts deleted", result.items_removed, result.carts_deleted);
            Some(result)
        },
        Err(e) => {
            error!("🧹️ Error purging stale carts: {e}");
            None
        },
    };
    let expired_payments = match payments.expire_stale_payments(config.payment_age).await {
        Ok(expired) => {
            info!("🧹️ {} stale pending payments failed", expired.len());
            if !expired.is_empty() {
                debug!("🧹️ Expired payments: {}", payment_list(&expired));
            }
            Some(expired.len())
        },
        Err(e) => {
            error!("🧹️ Error expiring stale payments: {e}");
            None
        },
    };
    CleanupReport { carts, expired_payments }
}

fn payment_list(payments: &[storefront_engine::db_types::Payment]) -> String {
    payments
        .iter()
        .map(|p| format!("[{}] order: {} txid: {}", p.id, p.order_id, p.transaction_id))
        .collect::<Vec<String>>()
        .join(", ")
}
