use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use parko_shared::errors::{AppError, AppResult, ErrorCode};
use parko_shared::middleware::AdminUser;
use parko_shared::types::pagination::{Paginated, PaginationParams};
use parko_shared::types::ApiResponse;

use crate::models::Penalty;
use crate::routes::penalties::{apply_penalty_changes, UpdatePenaltyRequest};
use crate::schema::penalties;
use crate::services::ledger::{self, PointsSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PenaltyFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub user_id: Option<Uuid>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl PenaltyFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserSummaryParams {
    pub as_of: Option<DateTime<Utc>>,
}

/// GET /admin/penalties - all penalties, optional user filter
pub async fn list_penalties(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<PenaltyFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Penalty>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let pagination = params.pagination();
    let offset = pagination.offset() as i64;
    let limit = pagination.limit() as i64;

    let (items, total): (Vec<Penalty>, i64) = if let Some(user_id) = params.user_id {
        let items = penalties::table
            .filter(penalties::user_id.eq(user_id))
            .order(penalties::start_date.desc())
            .offset(offset)
            .limit(limit)
            .load::<Penalty>(&mut conn)?;

        let total: i64 = penalties::table
            .filter(penalties::user_id.eq(user_id))
            .select(count_star())
            .first(&mut conn)?;

        (items, total)
    } else {
        let items = penalties::table
            .order(penalties::start_date.desc())
            .offset(offset)
            .limit(limit)
            .load::<Penalty>(&mut conn)?;

        let total: i64 = penalties::table.select(count_star()).first(&mut conn)?;

        (items, total)
    };

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &pagination))))
}

/// PUT /admin/penalties/:id - edit any penalty
pub async fn update_penalty(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(penalty_id): Path<Uuid>,
    Json(req): Json<UpdatePenaltyRequest>,
) -> AppResult<Json<ApiResponse<Penalty>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = penalties::table
        .find(penalty_id)
        .first::<Penalty>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PenaltyNotFound, "penalty not found"))?;

    let updated = apply_penalty_changes(&mut conn, &existing, &req)?;

    tracing::info!(
        penalty_id = %penalty_id,
        admin_id = %admin.0.id,
        "penalty edited by admin"
    );

    Ok(Json(ApiResponse::ok(updated)))
}

/// GET /admin/users/:id/points - accrued points for any user
pub async fn user_points_summary(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Query(params): Query<UserSummaryParams>,
) -> AppResult<Json<ApiResponse<PointsSummary>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows = penalties::table
        .filter(penalties::user_id.eq(user_id))
        .load::<Penalty>(&mut conn)?;

    let as_of = params.as_of.unwrap_or_else(Utc::now);
    Ok(Json(ApiResponse::ok(ledger::summarize(as_of, &rows))))
}
