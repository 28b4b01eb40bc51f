use order_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment setup (dotenv, logging)
    setup_environment()?;

    tracing::info!("Order utilities server starting...");

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize server state (opens the embedded store)
    let state = ServerState::initialize(&config)?;

    // 4. Run the HTTP server
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
