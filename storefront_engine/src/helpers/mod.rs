mod transaction_id;
mod webhook_signature;

pub use transaction_id::new_transaction_id;
pub use webhook_signature::{
    canonical_json,
    WebhookSignatureError,
    WebhookVerifier,
    SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
