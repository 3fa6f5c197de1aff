use axum::extract::{Path, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use parko_shared::errors::{AppError, AppResult, ErrorCode};
use parko_shared::live::ChangeOp;
use parko_shared::types::auth::AuthUser;
use parko_shared::types::ApiResponse;

use crate::models::{ChatMessage, FriendshipStatus, NewChatMessage};
use crate::schema::{chat_messages, friendships};
use crate::services::sync::{emit_row, CHAT_MESSAGES_TABLE};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    #[validate(length(max = 4000))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub total_unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: usize,
}

// --- Helpers ---

/// Chronological (oldest first) message history between two users.
pub(crate) fn load_conversation(
    conn: &mut diesel::pg::PgConnection,
    me: Uuid,
    peer: Uuid,
) -> QueryResult<Vec<ChatMessage>> {
    chat_messages::table
        .filter(
            chat_messages::sender_id.eq(me).and(chat_messages::receiver_id.eq(peer))
                .or(chat_messages::sender_id.eq(peer).and(chat_messages::receiver_id.eq(me))),
        )
        .order(chat_messages::created_at.asc())
        .load::<ChatMessage>(conn)
}

fn are_friends(
    conn: &mut diesel::pg::PgConnection,
    user_a: Uuid,
    user_b: Uuid,
) -> AppResult<bool> {
    let count: i64 = friendships::table
        .filter(
            friendships::requester_id.eq(user_a).and(friendships::addressee_id.eq(user_b))
                .or(friendships::requester_id.eq(user_b).and(friendships::addressee_id.eq(user_a))),
        )
        .filter(friendships::status.eq(FriendshipStatus::Accepted.to_string()))
        .select(count_star())
        .first(conn)?;
    Ok(count > 0)
}

// --- Handlers ---

/// POST /messages - send a chat message to a friend
pub async fn send_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<ChatMessage>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let settings = state.settings.get().await;
    if settings.maintenance_mode {
        return Err(AppError::new(
            ErrorCode::ServiceUnavailable,
            "the platform is under maintenance",
        ));
    }
    if !settings.chat_enabled {
        return Err(AppError::new(ErrorCode::ChatDisabled, "chat is currently disabled"));
    }

    if req.content.trim().is_empty() {
        return Err(AppError::new(ErrorCode::MessageEmpty, "message must not be empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    if !are_friends(&mut conn, user.id, req.receiver_id)? {
        return Err(AppError::forbidden("you can only message accepted friends"));
    }

    let new_message = NewChatMessage {
        sender_id: user.id,
        receiver_id: req.receiver_id,
        content: req.content,
        is_read: false,
    };

    let message: ChatMessage = diesel::insert_into(chat_messages::table)
        .values(&new_message)
        .get_result(&mut conn)?;

    emit_row(&state.feed, CHAT_MESSAGES_TABLE, ChangeOp::Insert, &message);

    // Push to the receiver's room; the sender's view already has the
    // message optimistically and deduplicates the feed copy.
    let room = format!("user:{}", message.receiver_id);
    let _ = state.io.to(room).emit("new_message", &message);

    tracing::info!(
        message_id = %message.id,
        sender = %message.sender_id,
        receiver = %message.receiver_id,
        "chat message sent"
    );

    Ok(Json(ApiResponse::ok(message)))
}

/// GET /messages/:peer_id - conversation with one user, oldest first
pub async fn conversation(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(peer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<ChatMessage>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let items = load_conversation(&mut conn, user.id, peer_id)?;
    Ok(Json(ApiResponse::ok(items)))
}

/// POST /messages/:peer_id/read - mark the peer's messages as read
pub async fn mark_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(peer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MarkReadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated: Vec<ChatMessage> = diesel::update(
        chat_messages::table
            .filter(chat_messages::sender_id.eq(peer_id))
            .filter(chat_messages::receiver_id.eq(user.id))
            .filter(chat_messages::is_read.eq(false)),
    )
    .set(chat_messages::is_read.eq(true))
    .get_results(&mut conn)?;

    for message in &updated {
        emit_row(&state.feed, CHAT_MESSAGES_TABLE, ChangeOp::Update, message);
    }

    if !updated.is_empty() {
        let room = format!("user:{peer_id}");
        let _ = state.io.to(room).emit(
            "messages_read",
            &serde_json::json!({ "reader_id": user.id, "count": updated.len() }),
        );
    }

    Ok(Json(ApiResponse::ok(MarkReadResponse { marked: updated.len() })))
}

/// GET /messages/unread-count - unread messages addressed to me
pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total_unread: i64 = chat_messages::table
        .filter(chat_messages::receiver_id.eq(user.id))
        .filter(chat_messages::is_read.eq(false))
        .select(count_star())
        .first(&mut conn)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { total_unread })))
}
