use axum::{routing::{get, put}, Router};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::pg::PgConnection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;

use config::AppConfig;
use parko_shared::clients::rabbitmq::RabbitMQClient;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    parko_shared::middleware::init_tracing("parko-admin");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq });

    let admin_routes = Router::new()
        .route("/settings", get(routes::settings::get_settings).put(routes::settings::update_settings))
        .route("/roles", get(routes::roles::list_roles))
        .route("/users/:id/role", put(routes::roles::grant_role).delete(routes::roles::revoke_role))
        .route("/audit-log", get(routes::audit::get_audit_log))
        .route("/stats", get(routes::audit::get_stats));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/internal/settings", get(routes::settings::internal_settings))
        .nest("/admin", admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "parko-admin starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
