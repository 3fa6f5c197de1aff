use axum::{routing::{get, post, put}, Router};
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
mod services;
mod sweep;

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
    parko_shared::middleware::init_tracing("parko-penalty");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq });

    // Background expiry sweep
    let sweep_state = state.clone();
    tokio::spawn(async move {
        sweep::run_expiry_sweep(sweep_state).await;
    });

    let admin_routes = Router::new()
        .route("/penalties", get(routes::admin::list_penalties))
        .route("/penalties/:id", put(routes::admin::update_penalty))
        .route("/users/:id/points", get(routes::admin::user_points_summary));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/penalties", get(routes::penalties::list_my_penalties).post(routes::penalties::create_penalty))
        .route("/penalties/summary", get(routes::penalties::points_summary))
        .route("/penalties/:id", put(routes::penalties::update_penalty).delete(routes::penalties::delete_penalty))
        .route("/penalties/:id/pay", post(routes::penalties::mark_paid))
        .nest("/admin", admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "parko-penalty starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
