#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]
#![doc = include_str!("../README.md")]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::JwtKeys;
use crate::api::SignInMode;
use crate::api::not_found;
use crate::api::router;
use crate::database::Database;
use crate::database::DatabaseConfig;
use crate::files::FileStore;
use crate::users::ensure_default_user;
use crate::users::ensure_initial_user;
use crate::utils::env_flag;
use crate::utils::env_var_or_else;

mod api;
mod database;
mod documents;
mod files;
mod graceful_shutdown;
mod navigation;
mod password;
#[cfg(test)]
mod tests;
mod users;
mod utils;

const DEFAULT_RUST_LOG: &str = "jotion=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(DatabaseConfig::DetectConfig).await?;

    let address = setup_address()?;
    let listener = TcpListener::bind(address).await?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// Test mode is enabled with `ENABLE_TEST_USER=true`
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Database connection
/// - Initial user setup
/// - File store configuration
pub async fn setup_app(database_config: DatabaseConfig) -> Result<Router> {
    let sign_in_mode = if env_flag("ENABLE_TEST_USER") {
        SignInMode::TestUser
    } else {
        SignInMode::Token
    };

    setup_app_with_sign_in_mode(database_config, sign_in_mode).await
}

/// Create and setup the app with an explicit sign in mode
///
/// # Errors
///
/// See [`setup_app`](setup_app)
pub async fn setup_app_with_sign_in_mode(
    database_config: DatabaseConfig,
    sign_in_mode: SignInMode,
) -> Result<Router> {
    let database = Database::from_config(database_config).await?;

    ensure_initial_user(&database).await?;

    if sign_in_mode == SignInMode::TestUser {
        tracing::warn!("Test mode is enabled, requests without a token act as the default user");

        ensure_default_user(&database).await?;
    }

    let file_store = FileStore::from_env()?;

    Ok(create_router(database, sign_in_mode, file_store))
}

/// Create the router for Jotion
fn create_router(database: Database, sign_in_mode: SignInMode, file_store: FileStore) -> Router {
    let jwt_keys = setup_jwt_keys();

    Router::new()
        .nest("/api", router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(database))
        .layer(Extension(jwt_keys))
        .layer(Extension(sign_in_mode))
        .layer(Extension(file_store))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_jwt_keys() -> JwtKeys {
    use crate::password::generate;

    let jwt_secret = env_var_or_else("JWT_SECRET", || {
        let jwt_secret = generate();
        tracing::info!("`JWT_SECRET` is not set, generating temporary one");
        jwt_secret
    });

    JwtKeys::new(jwt_secret.as_bytes())
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = utils::env_var("PORT") {
        address.set_port(port.parse::<u16>()?);
    }

    Ok(address)
}
