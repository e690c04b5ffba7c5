use drinks_server::{Config, Server, ServerState, init_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (.env, logging)
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    init_logger(config.log_json);

    tracing::info!(
        "Starting drinks-server {} (env: {})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    // 2. Store + token verifier
    let state = ServerState::initialize(&config).await?;

    // 3. HTTP
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
