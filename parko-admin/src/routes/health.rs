use axum::Json;
use parko_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("parko-admin", env!("CARGO_PKG_VERSION")))
}
