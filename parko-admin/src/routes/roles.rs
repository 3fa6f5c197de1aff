use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use parko_shared::errors::{AppError, AppResult, ErrorCode};
use parko_shared::middleware::AdminUser;
use parko_shared::types::auth::UserRole;
use parko_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{NewAdminAction, NewUserRoleRow, UserRoleRow};
use crate::schema::{admin_actions, user_roles};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GrantRoleRequest {
    pub role: String,
}

fn record_action(
    conn: &mut diesel::pg::PgConnection,
    admin_id: Uuid,
    action: &str,
    target_user_id: Uuid,
    details: serde_json::Value,
) -> AppResult<()> {
    let admin_action = NewAdminAction {
        admin_id,
        action: action.to_string(),
        target_user_id: Some(target_user_id),
        details: Some(details),
    };
    diesel::insert_into(admin_actions::table)
        .values(&admin_action)
        .execute(conn)?;
    Ok(())
}

/// GET /admin/roles - all explicit role grants
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<UserRoleRow>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let items = user_roles::table
        .order(user_roles::created_at.desc())
        .load::<UserRoleRow>(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

/// PUT /admin/users/:id/role - grant or change a user's role
pub async fn grant_role(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<GrantRoleRequest>,
) -> AppResult<Json<ApiResponse<UserRoleRow>>> {
    let role = req
        .role
        .parse::<UserRole>()
        .map_err(|e| AppError::new(ErrorCode::InvalidRole, e))?;

    if user_id == admin.0.id {
        return Err(AppError::new(
            ErrorCode::CannotChangeOwnRole,
            "you cannot change your own role",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing: Option<UserRoleRow> = user_roles::table
        .filter(user_roles::user_id.eq(user_id))
        .first::<UserRoleRow>(&mut conn)
        .optional()?;

    let row = if let Some(existing) = existing {
        diesel::update(user_roles::table.find(existing.id))
            .set((
                user_roles::role.eq(role.to_string()),
                user_roles::granted_by.eq(admin.0.id),
                user_roles::updated_at.eq(Utc::now()),
            ))
            .get_result::<UserRoleRow>(&mut conn)?
    } else {
        let new_row = NewUserRoleRow {
            user_id,
            role: role.to_string(),
            granted_by: admin.0.id,
        };
        diesel::insert_into(user_roles::table)
            .values(&new_row)
            .get_result::<UserRoleRow>(&mut conn)?
    };

    record_action(
        &mut conn,
        admin.0.id,
        "grant_role",
        user_id,
        serde_json::json!({ "role": row.role }),
    )?;

    publisher::publish_role_granted(&state.rabbitmq, user_id, &row.role, admin.0.id).await;

    Ok(Json(ApiResponse::ok(row)))
}

/// DELETE /admin/users/:id/role - revoke any explicit grant
pub async fn revoke_role(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if user_id == admin.0.id {
        return Err(AppError::new(
            ErrorCode::CannotChangeOwnRole,
            "you cannot change your own role",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(user_roles::table.filter(user_roles::user_id.eq(user_id)))
        .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::RoleNotFound, "no role grant for this user"));
    }

    record_action(
        &mut conn,
        admin.0.id,
        "revoke_role",
        user_id,
        serde_json::json!({}),
    )?;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "revoked": true }))))
}
