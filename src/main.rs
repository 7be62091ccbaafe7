mod auth;
mod catalog;
mod config;
mod error;
mod form;
mod listing;
mod models;
mod notify;
mod routes;
mod templates;
#[cfg(test)]
mod testing;
mod upload;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    catalog::{CatalogService, SupabaseCatalog},
    config::Config,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn CatalogService>,
}

pub fn app(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(routes::index))
        .route("/sign-in", post(routes::sign_in))
        .route("/sign-out", post(routes::sign_out))
        .route("/movies", get(routes::list).post(routes::create_movie))
        .route("/movies/grid", get(routes::grid))
        .route("/movies/new", get(routes::new_movie))
        .route("/movies/{id}", post(routes::update_movie))
        .route("/movies/{id}/edit", get(routes::edit_movie))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,cinedex=debug,tower_http=info".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("cinedex/0.1")
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let catalog: Arc<dyn CatalogService> = Arc::new(SupabaseCatalog::new(http, &config));

    let state = Arc::new(AppState { config: config.clone(), catalog });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
