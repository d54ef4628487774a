use store_server::{Config, Server, StoreState, setup_environment, setup_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv), then configuration, then logging
    setup_environment();
    let config = Config::from_env();
    setup_logging(&config);

    tracing::info!("Store server starting...");

    // 2. State (opens the database)
    let state = StoreState::initialize(&config)?;

    // 3. HTTP server
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
