use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::hash_password_with_cost;
use crate::configuration::{JwtSettings, Platform};
use crate::error::AppError;
use crate::middleware::RequestLogger;
use crate::routes::{create_user, health_check, login, refresh, reset, revoke, update_user};
use crate::store::{AccountStore, RefreshTokenLedger};

/// Handles shared by every request
///
/// Built once at startup; the signing secret inside `jwt` is never mutated
/// afterwards.
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub ledger: Arc<dyn RefreshTokenLedger>,
    pub jwt: JwtSettings,
    pub platform: Platform,
    pub password_hash_cost: u32,
    /// Hash verified against when a login names an unknown email, so that
    /// path costs as much as a wrong password
    pub dummy_password_hash: String,
}

impl AppState {
    /// # Errors
    /// - `ConfigError::InvalidValue` if a token lifetime is out of range
    /// - `CryptoError::HashingFailure` if `password_hash_cost` is unusable
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn RefreshTokenLedger>,
        jwt: JwtSettings,
        platform: Platform,
        password_hash_cost: u32,
    ) -> Result<Self, AppError> {
        jwt.validate()?;
        let dummy_password_hash =
            hash_password_with_cost(&uuid::Uuid::new_v4().to_string(), password_hash_cost)?;

        Ok(Self {
            accounts,
            ledger,
            jwt,
            platform,
            password_hash_cost,
            dummy_password_hash,
        })
    }
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(state.clone())
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/users", web::post().to(create_user))
            .route("/api/users", web::put().to(update_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/admin/reset", web::post().to(reset))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
