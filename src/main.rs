//! Article Board server
//!
//! A small multi-user article board: registration, cookie sessions and
//! author-owned articles.

use article_board::{api, core, db};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_SECRET: &str = "change-this-secret-in-production";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Print error to stderr since logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting Article Board v{}", article_board::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        path = ?config.database.path,
        pool_size = config.database.connection_pool_size,
        "Database configuration"
    );
    if config.security.session_secret == DEFAULT_SECRET {
        warn!("Using the default session secret; set BOARD_SECURITY__SESSION_SECRET");
    }

    let pool_size = u32::try_from(config.database.connection_pool_size)
        .map_err(|_| anyhow::anyhow!("connection_pool_size is too large"))?;
    let db = Arc::new(db::DatabaseManager::new(
        &config.database.path,
        pool_size,
        Duration::from_millis(config.database.busy_timeout),
    )?);

    let users = db::UserRepository::new(db.clone()).count().await?;
    info!(users, "Database initialized successfully");

    let server_url = format!("http://{}:{}", config.server.host, config.server.port);
    let server = api::ApiServer::new(&config, db);

    info!(url = %server_url, "Server ready - starting to serve requests");

    // Blocks until a shutdown signal arrives
    server.serve().await?;

    Ok(())
}
