use std::process;
use std::sync::Arc;

use bankid::Provider;
use log::*;
use service::{config::Config, init_bankid, logging::Logger, AppState};

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        warn!("Keeping the already installed logger: {}", e);
    }

    info!("Starting up identity_rs...");

    // The service must not run without valid certificate material.
    let session = match init_bankid(&config) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load BankID certificates: {}", e);
            process::exit(1);
        }
    };

    let sweeper = Arc::clone(session.cache()).spawn_sweeper(config.cache_sweep_interval());

    let provider: Arc<dyn Provider> = session;
    let app_state = AppState::new(config, provider);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {}", e);
        sweeper.abort();
        process::exit(1);
    }
}
