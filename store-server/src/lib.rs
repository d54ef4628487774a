//! Storefront backend: order lifecycle and payment reconciliation engine.
//!
//! The heart of the crate is [`store::StoreEngine`]: cart, promotion
//! lookup, loyalty ledger, the order creation pipeline and the
//! return/refund workflow, every state transition wrapped in a single redb
//! write transaction. Two racing triggers — the client's confirm call and
//! the provider webhook — converge on at most one order per payment
//! reference.

pub mod api;
pub mod auth;
pub mod core;
pub mod notify;
pub mod payments;
pub mod store;

pub use crate::core::{AppError, AppResponse, AppResult, Config, Server, StoreState};
pub use crate::store::{StoreEngine, StoreError, StoreResult};

/// Load `.env` into the process environment.
///
/// Call before [`Config::from_env`] so dotenv values are visible to it.
pub fn setup_environment() {
    dotenv::dotenv().ok();
}

/// Initialize logging. Production output drops ANSI colour.
pub fn setup_logging(config: &Config) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level.parse().unwrap_or(tracing::Level::INFO))
        .with_ansi(!config.is_production())
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Ok(dir) = std::env::var("LOG_DIR") {
        if std::path::Path::new(&dir).exists() {
            let appender = tracing_appender::rolling::daily(dir, "store-server");
            subscriber.with_writer(appender).init();
            return;
        }
    }
    subscriber.init();
}
