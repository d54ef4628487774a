//! HTTP server startup and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::core::{Config, StoreState};

pub struct Server {
    config: Config,
    state: StoreState,
}

impl Server {
    pub fn with_state(config: Config, state: StoreState) -> Self {
        Self { config, state }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let app = crate::api::build_app(self.state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Store server listening on {}", addr);

        let shutdown = Arc::new(Notify::new());
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down, draining connections...");
            trigger.notify_waiters();
        });

        let drain = shutdown.clone();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { drain.notified().await })
                .await
        });

        let budget = Duration::from_millis(self.config.shutdown_timeout_ms);
        tokio::select! {
            result = &mut server => result??,
            _ = async {
                shutdown.notified().await;
                tokio::time::sleep(budget).await;
            } => {
                tracing::warn!(
                    budget_ms = self.config.shutdown_timeout_ms,
                    "Shutdown budget exceeded, aborting open connections"
                );
                server.abort();
            }
        }

        tracing::info!("Store server stopped");
        Ok(())
    }
}
