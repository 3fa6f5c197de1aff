use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use parko_shared::errors::AppResult;
use parko_shared::types::auth::AuthUser;
use parko_shared::types::ApiResponse;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EmergencyNumbers {
    pub police: String,
    pub ambulance: String,
    pub fire: String,
    pub road_assist: String,
}

/// GET /emergency - emergency-service shortcut numbers.
///
/// Served from the injected settings cache, never fetched ad hoc.
pub async fn emergency_numbers(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<EmergencyNumbers>>> {
    let settings = state.settings.get().await;

    Ok(Json(ApiResponse::ok(EmergencyNumbers {
        police: settings.emergency_police,
        ambulance: settings.emergency_ambulance,
        fire: settings.emergency_fire,
        road_assist: settings.emergency_road_assist,
    })))
}
