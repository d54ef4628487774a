use crate::auth::JwtConfig;

/// Server configuration.
///
/// Every field can be overridden via environment variable:
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/store | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | JWT_SECRET | dev-secret-change-me-before-deploying | HS256 signing secret |
/// | WEBHOOK_SECRET | dev-webhook-secret | Payment provider HMAC secret |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | REQUEST_TIMEOUT_MS | 30000 | Per-request timeout |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown budget |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory; the redb database lives at `<work_dir>/store.redb`.
    pub work_dir: String,
    /// HTTP API port.
    pub http_port: u16,
    /// JWT validation config.
    pub jwt: JwtConfig,
    /// Shared secret for payment-provider webhook signatures.
    pub webhook_secret: String,
    /// Runtime environment: development | staging | production.
    pub environment: String,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Graceful shutdown timeout in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/store".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::from_env(),
            webhook_secret: std::env::var("WEBHOOK_SECRET")
                .unwrap_or_else(|_| "dev-webhook-secret".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Path of the redb database file.
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("store.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
