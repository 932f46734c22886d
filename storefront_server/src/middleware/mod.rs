mod webhook_signature;

pub use webhook_signature::{VerifiedWebhook, WebhookSignatureFactory, WebhookSignatureService};
