//! Application state for the reconciliation engine

use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::services::notifier::NotificationDispatcher;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// Constructed once at process start and passed explicitly into every
/// component; nothing in the engine holds process-wide mutable singletons.
#[derive(Clone)]
pub struct AppState {
    /// Ledger connection pool
    pub pool: SqlitePool,
    /// Webhook signature verification secret
    pub webhook_secret: String,
    /// Notification dispatcher with its configured channels
    pub dispatcher: NotificationDispatcher,
    /// Grace period applied when callers omit one (minutes)
    pub default_grace_minutes: i64,
}

impl AppState {
    /// Create a new AppState: connect the ledger, run migrations, wire the
    /// in-app dispatcher.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = db::connect(&config.database_url).await?;

        Ok(Self {
            pool,
            webhook_secret: config.webhook_secret.clone(),
            dispatcher: NotificationDispatcher::new(),
            default_grace_minutes: config.default_grace_minutes,
        })
    }

    /// State over an in-memory ledger, for tests and dev tooling
    pub async fn in_memory(webhook_secret: &str) -> Result<Self, BoxError> {
        let pool = db::connect_memory().await?;
        Ok(Self {
            pool,
            webhook_secret: webhook_secret.to_string(),
            dispatcher: NotificationDispatcher::new(),
            default_grace_minutes: 30,
        })
    }
}
