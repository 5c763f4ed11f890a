use std::sync::Arc;

use tracing::{error, info};

use drive::web::WebServer;
use drive::{BackendRegistry, Config};

#[tokio::main]
async fn main() {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = drive::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        drive::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Drive - multi-tenant file storage");

    let registry = Arc::new(BackendRegistry::new(config.storage.clone()));
    if let Err(e) = registry.backend().await {
        error!("Failed to initialize storage backend: {}", e);
        std::process::exit(1);
    }

    let server = match WebServer::new(&config, registry) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create web server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
