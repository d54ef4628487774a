//! Shared application state.

use std::sync::Arc;

use anyhow::Context;

use crate::auth::JwtService;
use crate::core::Config;
use crate::notify::TracingNotifier;
use crate::store::{StoreEngine, storage::StoreStorage};

/// Everything handlers need, cheap to clone.
#[derive(Clone, Debug)]
pub struct StoreState {
    pub config: Arc<Config>,
    pub engine: StoreEngine,
    pub jwt: Arc<JwtService>,
}

impl StoreState {
    /// Open the database under `config.work_dir` and assemble the engine.
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .with_context(|| format!("creating work dir {}", config.work_dir))?;

        let storage = StoreStorage::open(config.db_path())
            .with_context(|| format!("opening database at {}", config.db_path().display()))?;
        tracing::info!(path = %config.db_path().display(), "Database ready");

        let engine = StoreEngine::new(storage, Arc::new(TracingNotifier));
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self {
            config: Arc::new(config.clone()),
            engine,
            jwt,
        })
    }
}
