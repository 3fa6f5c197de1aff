use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use parko_shared::errors::{AppError, AppResult};
use parko_shared::middleware::AdminUser;
use parko_shared::types::pagination::{Paginated, PaginationParams};
use parko_shared::types::ApiResponse;

use crate::models::AdminAction;
use crate::routes::settings::load_or_seed;
use crate::schema::{admin_actions, user_roles};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub moderators: i64,
    pub admins: i64,
    pub actions_today: i64,
    pub settings_updated_at: chrono::DateTime<Utc>,
}

/// GET /admin/audit-log - paginated admin actions, newest first
pub async fn get_audit_log(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<AdminAction>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let items = admin_actions::table
        .order(admin_actions::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<AdminAction>(&mut conn)?;

    let total: i64 = admin_actions::table.select(count_star()).first(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

/// GET /admin/stats - console dashboard numbers
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let moderators: i64 = user_roles::table
        .filter(user_roles::role.eq("moderator"))
        .select(count_star())
        .first(&mut conn)?;

    let admins: i64 = user_roles::table
        .filter(user_roles::role.eq("admin"))
        .select(count_star())
        .first(&mut conn)?;

    let today_start = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or_else(Utc::now);

    let actions_today: i64 = admin_actions::table
        .filter(admin_actions::created_at.ge(today_start))
        .select(count_star())
        .first(&mut conn)?;

    let settings = load_or_seed(&mut conn)?;

    Ok(Json(ApiResponse::ok(DashboardStats {
        moderators,
        admins,
        actions_today,
        settings_updated_at: settings.updated_at,
    })))
}
