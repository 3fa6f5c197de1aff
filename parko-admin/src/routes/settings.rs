use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use parko_shared::errors::{AppError, AppResult};
use parko_shared::middleware::AdminUser;
use parko_shared::settings::PlatformSettings;
use parko_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{NewAdminAction, NewPlatformSettingsRow, PlatformSettingsRow};
use crate::schema::{admin_actions, platform_settings};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    pub reports_enabled: bool,
    pub chat_enabled: bool,
    pub friend_requests_enabled: bool,
    pub maintenance_mode: bool,
    #[validate(length(min = 1, max = 30))]
    pub emergency_police: String,
    #[validate(length(min = 1, max = 30))]
    pub emergency_ambulance: String,
    #[validate(length(min = 1, max = 30))]
    pub emergency_fire: String,
    #[validate(length(min = 1, max = 30))]
    pub emergency_road_assist: String,
}

/// Load the singleton settings row, seeding defaults on first touch.
pub(crate) fn load_or_seed(
    conn: &mut diesel::pg::PgConnection,
) -> AppResult<PlatformSettingsRow> {
    if let Some(row) = platform_settings::table
        .first::<PlatformSettingsRow>(conn)
        .optional()?
    {
        return Ok(row);
    }

    let seeded = diesel::insert_into(platform_settings::table)
        .values(NewPlatformSettingsRow::defaults())
        .get_result::<PlatformSettingsRow>(conn)?;

    tracing::info!("seeded default platform settings");
    Ok(seeded)
}

/// GET /admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<PlatformSettingsRow>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let row = load_or_seed(&mut conn)?;
    Ok(Json(ApiResponse::ok(row)))
}

/// PUT /admin/settings - full replace; publishes settings.updated so
/// every service cache refetches.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(req): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<PlatformSettingsRow>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let current = load_or_seed(&mut conn)?;

    let updated: PlatformSettingsRow = diesel::update(platform_settings::table.find(current.id))
        .set((
            platform_settings::reports_enabled.eq(req.reports_enabled),
            platform_settings::chat_enabled.eq(req.chat_enabled),
            platform_settings::friend_requests_enabled.eq(req.friend_requests_enabled),
            platform_settings::maintenance_mode.eq(req.maintenance_mode),
            platform_settings::emergency_police.eq(&req.emergency_police),
            platform_settings::emergency_ambulance.eq(&req.emergency_ambulance),
            platform_settings::emergency_fire.eq(&req.emergency_fire),
            platform_settings::emergency_road_assist.eq(&req.emergency_road_assist),
            platform_settings::updated_by.eq(Some(admin.0.id)),
            platform_settings::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)?;

    // Audit trail
    let admin_action = NewAdminAction {
        admin_id: admin.0.id,
        action: "update_settings".to_string(),
        target_user_id: None,
        details: Some(serde_json::json!({
            "reports_enabled": updated.reports_enabled,
            "chat_enabled": updated.chat_enabled,
            "friend_requests_enabled": updated.friend_requests_enabled,
            "maintenance_mode": updated.maintenance_mode,
        })),
    };
    diesel::insert_into(admin_actions::table)
        .values(&admin_action)
        .execute(&mut conn)?;

    publisher::publish_settings_updated(&state.rabbitmq, admin.0.id).await;

    tracing::info!(admin_id = %admin.0.id, "platform settings updated");

    Ok(Json(ApiResponse::ok(updated)))
}

/// GET /internal/settings - unauthenticated snapshot for service caches
pub async fn internal_settings(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<PlatformSettings>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let row = load_or_seed(&mut conn)?;
    Ok(Json(PlatformSettings::from(&row)))
}
