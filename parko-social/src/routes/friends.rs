use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use parko_shared::errors::{AppError, AppResult, ErrorCode};
use parko_shared::live::ChangeOp;
use parko_shared::types::auth::AuthUser;
use parko_shared::types::ApiResponse;

use crate::models::{Friendship, FriendshipStatus, NewFriendship};
use crate::schema::friendships;
use crate::services::friendship::{next_status, FriendshipAction};
use crate::services::sync::{emit_row, FRIENDSHIPS_TABLE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct FriendListParams {
    pub status: Option<String>,
}

// --- Helpers ---

fn load_friendship(
    conn: &mut diesel::pg::PgConnection,
    friendship_id: Uuid,
) -> AppResult<Friendship> {
    friendships::table
        .find(friendship_id)
        .first::<Friendship>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::FriendshipNotFound, "friendship not found"))
}

/// Find the row for an unordered pair, whichever direction it was
/// created in.
fn find_pair(
    conn: &mut diesel::pg::PgConnection,
    user_a: Uuid,
    user_b: Uuid,
) -> AppResult<Option<Friendship>> {
    let row = friendships::table
        .filter(
            friendships::requester_id.eq(user_a).and(friendships::addressee_id.eq(user_b))
                .or(friendships::requester_id.eq(user_b).and(friendships::addressee_id.eq(user_a))),
        )
        .first::<Friendship>(conn)
        .optional()?;
    Ok(row)
}

async fn apply_transition(
    state: &Arc<AppState>,
    user: &AuthUser,
    friendship_id: Uuid,
    action: FriendshipAction,
) -> AppResult<Friendship> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let friendship = load_friendship(&mut conn, friendship_id)?;

    if !friendship.touches(user.id) {
        return Err(AppError::new(
            ErrorCode::NotFriendshipParty,
            "you are not part of this friendship",
        ));
    }

    let current = friendship
        .status
        .parse::<FriendshipStatus>()
        .map_err(AppError::internal)?;
    let actor_is_addressee = friendship.addressee_id == user.id;

    let new_status = next_status(current, action, actor_is_addressee)
        .map_err(|e| AppError::new(ErrorCode::InvalidFriendshipTransition, e))?;

    let updated: Friendship = diesel::update(friendships::table.find(friendship_id))
        .set((
            friendships::status.eq(new_status.to_string()),
            friendships::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)?;

    emit_row(&state.feed, FRIENDSHIPS_TABLE, ChangeOp::Update, &updated);
    notify_both(state, &updated, "friendship_changed");

    Ok(updated)
}

fn notify_both(state: &Arc<AppState>, friendship: &Friendship, event: &'static str) {
    for user_id in [friendship.requester_id, friendship.addressee_id] {
        let room = format!("user:{user_id}");
        let _ = state.io.to(room).emit(event, friendship);
    }
}

// --- Handlers ---

/// POST /friends/:id - send a friend request to a user
pub async fn send_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Friendship>>> {
    let settings = state.settings.get().await;
    if settings.maintenance_mode {
        return Err(AppError::new(
            ErrorCode::ServiceUnavailable,
            "the platform is under maintenance",
        ));
    }
    if !settings.friend_requests_enabled {
        return Err(AppError::new(
            ErrorCode::FriendRequestsDisabled,
            "friend requests are currently disabled",
        ));
    }

    if target_id == user.id {
        return Err(AppError::new(ErrorCode::CannotFriendSelf, "cannot friend yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // One row per unordered pair; a repeat request is informational,
    // never an error and never a second row.
    if let Some(existing) = find_pair(&mut conn, user.id, target_id)? {
        return Ok(Json(ApiResponse::ok_with_message(
            existing,
            "a friendship with this user already exists",
        )));
    }

    let new_friendship = NewFriendship {
        requester_id: user.id,
        addressee_id: target_id,
        status: FriendshipStatus::Pending.to_string(),
    };

    let inserted = diesel::insert_into(friendships::table)
        .values(&new_friendship)
        .get_result::<Friendship>(&mut conn);

    let friendship = match inserted {
        Ok(f) => f,
        Err(e) => {
            // A concurrent request won the unique index; surface the
            // winner instead of failing.
            let err = AppError::Database(e);
            if err.is_unique_violation() {
                let existing = find_pair(&mut conn, user.id, target_id)?.ok_or(err)?;
                return Ok(Json(ApiResponse::ok_with_message(
                    existing,
                    "a friendship with this user already exists",
                )));
            }
            return Err(err);
        }
    };

    emit_row(&state.feed, FRIENDSHIPS_TABLE, ChangeOp::Insert, &friendship);

    let room = format!("user:{target_id}");
    let _ = state.io.to(room).emit("friendship_request", &friendship);

    tracing::info!(
        friendship_id = %friendship.id,
        requester = %user.id,
        addressee = %target_id,
        "friend request sent"
    );

    Ok(Json(ApiResponse::ok(friendship)))
}

/// POST /friends/:id/respond - addressee accepts or declines
pub async fn respond(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(friendship_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> AppResult<Json<ApiResponse<Friendship>>> {
    let action = if req.accepted {
        FriendshipAction::Accept
    } else {
        FriendshipAction::Decline
    };

    let updated = apply_transition(&state, &user, friendship_id, action).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// POST /friends/:id/block
pub async fn block(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Friendship>>> {
    let updated = apply_transition(&state, &user, friendship_id, FriendshipAction::Block).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// POST /friends/:id/unblock
pub async fn unblock(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Friendship>>> {
    let updated = apply_transition(&state, &user, friendship_id, FriendshipAction::Unblock).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /friends/:id - remove the edge entirely
pub async fn remove(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let friendship = load_friendship(&mut conn, friendship_id)?;

    if !friendship.touches(user.id) {
        return Err(AppError::new(
            ErrorCode::NotFriendshipParty,
            "you are not part of this friendship",
        ));
    }

    diesel::delete(friendships::table.find(friendship_id)).execute(&mut conn)?;

    emit_row(&state.feed, FRIENDSHIPS_TABLE, ChangeOp::Delete, &friendship);
    notify_both(&state, &friendship, "friendship_removed");

    Ok(Json(ApiResponse::ok(serde_json::json!({ "removed": true }))))
}

/// GET /friends?status= - friendships touching the current user
pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<FriendListParams>,
) -> AppResult<Json<ApiResponse<Vec<Friendship>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let base = friendships::table
        .filter(
            friendships::requester_id.eq(user.id)
                .or(friendships::addressee_id.eq(user.id)),
        )
        .order(friendships::created_at.desc());

    let items = if let Some(raw) = &params.status {
        let status = raw
            .parse::<FriendshipStatus>()
            .map_err(AppError::Validation)?;
        base.filter(friendships::status.eq(status.to_string()))
            .load::<Friendship>(&mut conn)?
    } else {
        base.load::<Friendship>(&mut conn)?
    };

    Ok(Json(ApiResponse::ok(items)))
}
