use axum::{routing::{get, post}, Router};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::pg::PgConnection;
use socketioxide::SocketIo;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;
mod socket;

use config::AppConfig;
use parko_shared::clients::rabbitmq::RabbitMQClient;
use parko_shared::clients::redis::RedisClient;
use parko_shared::live::ChangeFeed;
use parko_shared::settings::SettingsCache;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub settings: SettingsCache,
    pub io: SocketIo,
    pub feed: ChangeFeed,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    parko_shared::middleware::init_tracing("parko-social");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    let metrics_handle = parko_shared::middleware::init_metrics();

    let settings = SettingsCache::new(
        format!("{}/internal/settings", config.admin_service_url),
        reqwest::Client::new(),
    );

    let refresh_settings = settings.clone();
    let refresh_rabbitmq = rabbitmq.clone();
    tokio::spawn(async move {
        if let Err(e) = refresh_settings
            .run_refresh_loop(&refresh_rabbitmq, "parko-social.settings")
            .await
        {
            tracing::error!(error = %e, "settings refresh loop failed");
        }
    });

    // Build Socket.IO layer - io lives in AppState so REST routes and
    // subscribers can push to user rooms
    let (sio_layer, io) = SocketIo::builder().build_layer();

    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        settings,
        io: io.clone(),
        feed: ChangeFeed::new(),
        metrics_handle,
    });

    io.ns("/", {
        let state = state.clone();
        move |socket: socketioxide::extract::SocketRef| {
            let state = state.clone();
            async move {
                socket::handlers::on_connect_with_state(socket, state).await;
            }
        }
    });

    // Cross-service fanout: forward report and penalty events to rooms
    let report_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_report_events(report_state).await {
            tracing::error!(error = %e, "report subscriber failed");
        }
    });

    let penalty_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_penalty_events(penalty_state).await {
            tracing::error!(error = %e, "penalty subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Friendships
        .route("/friends", get(routes::friends::list))
        .route("/friends/:id", post(routes::friends::send_request).delete(routes::friends::remove))
        .route("/friends/:id/respond", post(routes::friends::respond))
        .route("/friends/:id/block", post(routes::friends::block))
        .route("/friends/:id/unblock", post(routes::friends::unblock))
        // Chat
        .route("/messages", post(routes::chat::send_message))
        .route("/messages/unread-count", get(routes::chat::unread_count))
        .route("/messages/:peer_id", get(routes::chat::conversation))
        .route("/messages/:peer_id/read", post(routes::chat::mark_read))
        .layer(axum::middleware::from_fn(parko_shared::middleware::metrics_middleware))
        .layer(sio_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "parko-social starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
