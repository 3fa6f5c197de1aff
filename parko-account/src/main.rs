use axum::{routing::{get, put}, Router};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::pg::PgConnection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use parko_shared::clients::rabbitmq::RabbitMQClient;
use parko_shared::settings::SettingsCache;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub settings: SettingsCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    parko_shared::middleware::init_tracing("parko-account");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let settings = SettingsCache::new(
        format!("{}/internal/settings", config.admin_service_url),
        reqwest::Client::new(),
    );

    // Keep the settings snapshot fresh from settings.updated events
    let refresh_settings = settings.clone();
    tokio::spawn(async move {
        if let Err(e) = refresh_settings
            .run_refresh_loop(&rabbitmq, "parko-account.settings")
            .await
        {
            tracing::error!(error = %e, "settings refresh loop failed");
        }
    });

    let state = Arc::new(AppState { db, config, settings });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // Profiles
        .route("/me", get(routes::profile::get_me).put(routes::profile::upsert_me))
        .route("/profiles/:id", get(routes::profile::get_profile))
        // Cars
        .route("/cars", get(routes::cars::list_my_cars).post(routes::cars::register_car))
        .route("/cars/:id", put(routes::cars::update_car).delete(routes::cars::delete_car))
        .route("/cars/:id/qr", get(routes::cars::car_qr))
        // Emergency shortcuts
        .route("/emergency", get(routes::emergency::emergency_numbers))
        // Service-internal
        .route("/internal/resolve-plate", get(routes::internal::resolve_plate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "parko-account starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
