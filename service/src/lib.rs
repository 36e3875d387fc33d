mod auth;
mod error;
mod handler;
mod model;
mod route;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use abi::{Config, DbConfig};
use booking::{BookingManager, Bookings, UserManager, UserStore};

pub use auth::{AuthorizedUser, StaticTokens, TokenVerifier};
pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn Bookings>,
    pub users: Arc<dyn UserStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Build the application router over any store/verifier implementations.
pub fn app(state: AppState) -> Router {
    route::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect the pool: bounded size, 10 s checkout timeout, 30 s idle
/// reap, and a 30 s server-side statement timeout on every connection
/// so a wedged query aborts instead of holding its transaction open.
pub async fn connect_database(cfg: &DbConfig) -> Result<PgPool, abi::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(30))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET statement_timeout = '30s'").await?;
                Ok(())
            })
        })
        .connect(&cfg.url())
        .await?;
    Ok(pool)
}

pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let pool = connect_database(&config.db).await?;
    let state = AppState {
        bookings: Arc::new(BookingManager::new(pool.clone())),
        users: Arc::new(UserManager::new(pool)),
        verifier: Arc::new(StaticTokens::from_config(&config.auth)),
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
