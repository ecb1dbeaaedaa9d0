use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::get_configuration;
use chirpy::startup::{run, AppState};
use chirpy::store::{AccountStore, MemoryStore, PgStore, RefreshTokenLedger};
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Token issuance refuses to run without a secret; say so up front
    if let Err(e) = configuration.jwt.signing_secret() {
        tracing::error!(
            error = %e,
            "JWT signing secret is not configured; authentication will fail"
        );
    }

    let (accounts, ledger): (Arc<dyn AccountStore>, Arc<dyn RefreshTokenLedger>) =
        match &configuration.database {
            Some(database) => {
                tracing::info!("Attempting to connect to database");
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database.connection_string())
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to create connection pool: {}", e);
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionRefused,
                            "Database connection error",
                        )
                    })?;

                let store = Arc::new(PgStore::new(pool));
                store.migrate().await.map_err(|e| {
                    tracing::error!("Failed to run migrations: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
                })?;
                tracing::info!("Database connection pool created successfully");
                (
                    store.clone() as Arc<dyn AccountStore>,
                    store as Arc<dyn RefreshTokenLedger>,
                )
            }
            None => {
                tracing::warn!("No database configured; using in-memory store");
                let store = Arc::new(MemoryStore::new());
                (
                    store.clone() as Arc<dyn AccountStore>,
                    store as Arc<dyn RefreshTokenLedger>,
                )
            }
        };

    let state = AppState::new(
        accounts,
        ledger,
        configuration.jwt.clone(),
        configuration.application.platform,
        configuration.application.password_hash_cost,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Invalid application settings");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, state)?.await
}
