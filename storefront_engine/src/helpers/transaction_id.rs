/// Mints a locally-generated transaction reference, e.g. `TXN6F1C0E...`.
///
/// The reference is the prefix followed by 128 random bits as 32 uppercase hex digits, so collisions are not a
/// practical concern. The `payments.transaction_id` unique constraint is the backstop.
pub fn new_transaction_id(prefix: &str) -> String {
    let nonce = rand::random::<u128>();
    format!("{prefix}{nonce:032X}")
}
