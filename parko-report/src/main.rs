use axum::{routing::{get, post}, Router, extract::DefaultBodyLimit};
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

use config::AppConfig;
use parko_shared::clients::minio::MinioClient;
use parko_shared::clients::rabbitmq::RabbitMQClient;
use parko_shared::clients::redis::RedisClient;
use parko_shared::settings::SettingsCache;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub minio: MinioClient,
    pub settings: SettingsCache,
    pub http_client: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    parko_shared::middleware::init_tracing("parko-report");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;

    let settings = SettingsCache::new(
        format!("{}/internal/settings", config.admin_service_url),
        reqwest::Client::new(),
    );

    let refresh_settings = settings.clone();
    let refresh_rabbitmq = rabbitmq.clone();
    tokio::spawn(async move {
        if let Err(e) = refresh_settings
            .run_refresh_loop(&refresh_rabbitmq, "parko-report.settings")
            .await
        {
            tracing::error!(error = %e, "settings refresh loop failed");
        }
    });

    let http_client = reqwest::Client::new();
    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        minio,
        settings,
        http_client,
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/reports", post(routes::reports::submit_report))
        .route("/reports/with-evidence", post(routes::reports::submit_with_evidence)
            .layer(DefaultBodyLimit::max(20 * 1024 * 1024)))
        .route("/reports/mine", get(routes::reports::list_mine))
        .route("/reports/against-me", get(routes::reports::list_against_me))
        .route("/reports/:id/resolve", post(routes::reports::resolve_report))
        .route("/resolve-plate", get(routes::reports::resolve_preview))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "parko-report starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
