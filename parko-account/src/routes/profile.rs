use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use parko_shared::errors::{AppError, AppResult, ErrorCode};
use parko_shared::types::auth::AuthUser;
use parko_shared::types::ApiResponse;

use crate::models::{NewProfile, Profile, ProfileChanges};
use crate::schema::profiles;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// GET /me - current user's profile
pub async fn get_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::user_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /me - create or update the current user's profile
pub async fn upsert_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing: Option<Profile> = profiles::table
        .filter(profiles::user_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .optional()?;

    let profile = if let Some(existing) = existing {
        let changes = ProfileChanges {
            display_name: req.display_name,
            phone: req.phone,
            avatar_url: req.avatar_url,
            updated_at: Utc::now(),
        };
        diesel::update(profiles::table.find(existing.id))
            .set(&changes)
            .get_result::<Profile>(&mut conn)?
    } else {
        let new_profile = NewProfile {
            user_id: user.id,
            display_name: req.display_name,
            phone: req.phone,
            avatar_url: req.avatar_url,
        };
        diesel::insert_into(profiles::table)
            .values(&new_profile)
            .get_result::<Profile>(&mut conn)?
    };

    Ok(Json(ApiResponse::ok(profile)))
}

/// GET /profiles/:id - public profile view (profile id or user id)
pub async fn get_profile(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(
            profiles::id.eq(target_id)
                .or(profiles::user_id.eq(target_id)),
        )
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}
