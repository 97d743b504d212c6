// ABOUTME: Main entry point for the reelmark movie discovery and rating API
// ABOUTME: Loads configuration, prepares storage and the catalog client, and serves the routes

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod auth;
mod catalog;
mod config;
mod entities;
mod error;
mod middleware;
mod migration;
mod password;
mod routes;
mod storage;
mod token;
mod types;

#[cfg(test)]
mod storage_tests;

use catalog::{MovieCatalog, TmdbCatalog};
use config::Config;
use password::Passwords;
use storage::Storage;
use token::TokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub tokens: TokenIssuer,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::login))
        .route("/movies", get(routes::movies::list_movies))
        .route("/movies/:movie_id", get(routes::movies::get_movie))
        .route("/movies/:movie_id/play", get(routes::movies::play_movie))
        .route("/ratings", post(routes::ratings::create_rating))
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/:user_id",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/users/:user_id/favorites",
            put(routes::users::toggle_favorite).get(routes::users::list_favorites),
        )
        .route("/users/:user_id/isFavorite", get(routes::users::is_favorite))
        .route(
            "/users/:user_id/rating",
            get(routes::users::get_rating)
                .patch(routes::users::update_rating)
                .delete(routes::users::delete_rating),
        )
        .layer(from_fn_with_state(state.clone(), middleware::authenticate))
        .layer(from_fn(middleware::security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let passwords = Passwords::new(config.argon2_memory_kib, config.argon2_iterations)?;
    let storage = Arc::new(Storage::connect(&config.database_url, passwords).await?);

    let catalog: Arc<dyn MovieCatalog> = Arc::new(TmdbCatalog::new(
        &config.catalog_base_url,
        &config.catalog_api_key,
        config.catalog_timeout,
    )?);

    let tokens = TokenIssuer::new(&config.secret_key, config.token_ttl_secs);

    let app = router(AppState {
        storage,
        catalog,
        tokens,
    });

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
