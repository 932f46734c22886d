mod amount;
mod helpers;

pub mod op;
mod secret;

pub use amount::{Amount, AmountConversionError};
pub use helpers::{env_flag, parse_boolean_flag};
pub use secret::Secret;
