use std::env;

use chrono::Duration;
use log::*;
use rand::{thread_rng, RngCore};
use sfg_common::{env_flag, Secret};
use storefront_engine::{payment_objects::DEFAULT_TRANSACTION_PREFIX, sqlite_db::db_url, DEFAULT_CHECKOUT_ATTEMPTS};

const DEFAULT_SFG_HOST: &str = "127.0.0.1";
const DEFAULT_SFG_PORT: u16 = 8460;
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::seconds(300);
const DEFAULT_CART_AGE: Duration = Duration::hours(24);
const DEFAULT_PAYMENT_AGE: Duration = Duration::hours(24);
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
    /// Every provider transaction id must start with this prefix. Locally minted ids use it too.
    pub transaction_prefix: String,
    /// How many times a checkout or status change is attempted when it runs into lock contention.
    pub max_attempts: u32,
    /// If true, the access log records the client address from the X-Forwarded-For header rather than the peer
    /// address of the connection.
    pub use_x_forwarded_for: bool,
    pub cleanup: CleanupConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFG_HOST.to_string(),
            port: DEFAULT_SFG_PORT,
            database_url: String::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
            transaction_prefix: DEFAULT_TRANSACTION_PREFIX.to_string(),
            max_attempts: DEFAULT_CHECKOUT_ATTEMPTS,
            use_x_forwarded_for: false,
            cleanup: CleanupConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFG_HOST").ok().unwrap_or_else(|| DEFAULT_SFG_HOST.into());
        let port = env::var("SFG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SFG_PORT. {e} Using the default, {DEFAULT_SFG_PORT}, instead."
                    );
                    DEFAULT_SFG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SFG_PORT);
        let database_url = db_url();
        let max_connections = parse_number("SFG_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let auth = AuthConfig::from_env_or_default();
        let webhook = WebhookConfig::from_env_or_default();
        let transaction_prefix = env::var("SFG_TRANSACTION_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TRANSACTION_PREFIX.to_string());
        let max_attempts = parse_number("SFG_CHECKOUT_MAX_ATTEMPTS", DEFAULT_CHECKOUT_ATTEMPTS).max(1);
        let use_x_forwarded_for = env_flag("SFG_USE_X_FORWARDED_FOR", false);
        let cleanup = CleanupConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_connections,
            auth,
            webhook,
            transaction_prefix,
            max_attempts,
            use_x_forwarded_for,
            cleanup,
        }
    }
}

fn parse_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name}: {s}. {e}. Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that access tokens are signed with by the identity service.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No externally issued \
             access token will be accepted. Set SFG_JWT_SECRET to the secret used by your identity service. 🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill_bytes(&mut key);
        Self { jwt_secret: Secret::new(hex::encode(key)) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.into()) }
    }

    pub fn from_env_or_default() -> Self {
        match env::var("SFG_JWT_SECRET") {
            Ok(s) if !s.is_empty() => Self::new(s),
            _ => Self::default(),
        }
    }
}

//-------------------------------------------------  WebhookConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub secret: Secret<String>,
    /// Maximum distance between a webhook's timestamp and the current time.
    pub tolerance: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { secret: Secret::default(), tolerance: DEFAULT_WEBHOOK_TOLERANCE }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = Secret::from(env::var("SFG_WEBHOOK_SECRET").unwrap_or_default());
        if secret.is_unset() {
            error!(
                "🪛️ SFG_WEBHOOK_SECRET is not set. Every payment webhook will be rejected until it is set to the \
                 secret shared with the payment providers."
            );
        }
        let tolerance = parse_number("SFG_WEBHOOK_TOLERANCE_SECONDS", DEFAULT_WEBHOOK_TOLERANCE.num_seconds());
        Self { secret, tolerance: Duration::seconds(tolerance.max(0)) }
    }
}

//-------------------------------------------------  CleanupConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct CleanupConfig {
    /// Carts that have not been touched for this long lose their items.
    pub cart_age: Duration,
    /// Payments that are still pending after this long are marked as failed.
    pub payment_age: Duration,
    /// Delete carts that end up empty after a cleanup run.
    pub delete_empty_carts: bool,
    /// `None` disables the cleanup worker.
    pub interval: Option<std::time::Duration>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cart_age: DEFAULT_CART_AGE,
            payment_age: DEFAULT_PAYMENT_AGE,
            delete_empty_carts: false,
            interval: Some(std::time::Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS)),
        }
    }
}

impl CleanupConfig {
    pub fn from_env_or_default() -> Self {
        let cart_age = Duration::hours(parse_number("SFG_CART_AGE_HOURS", DEFAULT_CART_AGE.num_hours()).max(1));
        let payment_age =
            Duration::hours(parse_number("SFG_PAYMENT_AGE_HOURS", DEFAULT_PAYMENT_AGE.num_hours()).max(1));
        let delete_empty_carts = env_flag("SFG_DELETE_EMPTY_CARTS", false);
        let interval = match parse_number("SFG_CLEANUP_INTERVAL_SECONDS", DEFAULT_CLEANUP_INTERVAL_SECS) {
            0 => {
                info!("🪛️ SFG_CLEANUP_INTERVAL_SECONDS is 0. The cleanup worker is disabled.");
                None
            },
            secs => Some(std::time::Duration::from_secs(secs)),
        };
        Self { cart_age, payment_age, delete_empty_carts, interval }
    }
}
