use std::{future::Future, time::Duration};

use log::*;
use rand::Rng;

use crate::traits::FulfillmentError;

const BASE_BACKOFF_MS: u64 = 20;
const MAX_JITTER_MS: u64 = 20;

/// Runs `op` until it succeeds, fails with a non-transient error, or `max_attempts` attempts have been made.
///
/// Each attempt must be a complete unit of work (typically one database transaction) so that running it again is
/// safe. Between attempts there is a short exponential backoff with jitter. When the attempts are exhausted, the last
/// transient error is returned to the caller, who should surface it as a retryable failure.
pub async fn retry_transient<T, F, Fut>(label: &str, max_attempts: u32, mut op: F) -> Result<T, FulfillmentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FulfillmentError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1) + jitter;
                warn!("🔁️ {label}: attempt {attempt}/{max_attempts} hit lock contention ({e}). Retrying in {delay}ms");
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            },
            Err(e) if e.is_transient() => {
                warn!("🔁️ {label}: giving up after {attempt} attempts. {e}");
                return Err(e);
            },
            result => return result,
        }
    }
}
