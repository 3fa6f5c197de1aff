use std::sync::Arc;

use serde::Serialize;
use socketioxide::extract::{Data, SocketRef};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use parko_shared::live::{ChangeOp, FeedItem, LiveCollection};

use crate::models::ChatMessage;
use crate::routes::chat::load_conversation;
use crate::services::sync::ChannelScope;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// The watch task for the conversation view this socket currently has
/// mounted. Replacing or clearing it aborts the previous task first, so
/// a stale view can never receive another event.
#[derive(Clone, Default)]
pub struct WatchHandle(Arc<Mutex<Option<JoinHandle<()>>>>);

impl WatchHandle {
    async fn replace(&self, handle: Option<JoinHandle<()>>) {
        let mut slot = self.0.lock().await;
        if let Some(old) = slot.take() {
            old.abort();
        }
        *slot = handle;
    }
}

fn get_user_id(socket: &SocketRef) -> Option<Uuid> {
    socket.extensions.get::<Uuid>()
}

pub async fn on_connect_with_state(socket: SocketRef, state: Arc<AppState>) {
    let user_id = match authenticate_socket(&socket, &state) {
        Ok(id) => id,
        Err(msg) => {
            tracing::warn!(error = %msg, "social socket auth failed");
            let _ = socket.emit(
                "error",
                &ErrorPayload {
                    code: "AUTH_FAILED".into(),
                    message: msg,
                },
            );
            socket.disconnect().ok();
            return;
        }
    };

    socket.extensions.insert(user_id);
    socket.extensions.insert(WatchHandle::default());

    // Per-user room so REST handlers can push to this user
    let user_room = format!("user:{user_id}");
    socket.join(user_room).ok();

    tracing::info!(user_id = %user_id, sid = %socket.id, "social socket connected");

    // Presence in Redis
    let _ = state.redis.set(&format!("online:{user_id}"), "1", 120).await;

    let _ = socket.emit("connected", &serde_json::json!({ "user_id": user_id }));

    // Mount a conversation view: stream its scoped events until unwatch
    socket.on("watch_conversation", {
        let state = state.clone();
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| {
            let state = state.clone();
            async move {
                on_watch_conversation(socket, payload, state).await;
            }
        }
    });

    socket.on("unwatch_conversation", |socket: SocketRef| async move {
        if let Some(watch) = socket.extensions.get::<WatchHandle>() {
            watch.replace(None).await;
        }
    });

    // Heartbeat handler - refresh presence TTL
    socket.on("heartbeat", {
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                if let Some(user_id) = get_user_id(&socket) {
                    let _ = state.redis.set(&format!("online:{user_id}"), "1", 120).await;
                }
            }
        }
    });

    socket.on_disconnect({
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                on_disconnect_with_state(socket, state).await;
            }
        }
    });
}

async fn on_disconnect_with_state(socket: SocketRef, state: Arc<AppState>) {
    let user_id = match get_user_id(&socket) {
        Some(id) => id,
        None => return,
    };

    tracing::info!(user_id = %user_id, sid = %socket.id, "social socket disconnected");

    // Tear down the watch unconditionally; leaked channels would keep
    // delivering events to a dead view.
    if let Some(watch) = socket.extensions.get::<WatchHandle>() {
        watch.replace(None).await;
    }

    let _ = state.redis.del(&format!("online:{user_id}")).await;
}

async fn on_watch_conversation(socket: SocketRef, payload: serde_json::Value, state: Arc<AppState>) {
    let user_id = match get_user_id(&socket) {
        Some(id) => id,
        None => return,
    };

    let peer_id = match payload
        .get("peer_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        Some(id) => id,
        None => {
            tracing::warn!("watch_conversation missing peer_id");
            return;
        }
    };

    let watch = match socket.extensions.get::<WatchHandle>() {
        Some(w) => w,
        None => return,
    };

    let task_socket = socket.clone();
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        run_conversation_watch(task_socket, task_state, user_id, peer_id).await;
    });

    // One mounted conversation per socket; a new watch replaces (and
    // aborts) the previous one.
    watch.replace(Some(handle)).await;
}

/// Keep one conversation view synchronized over the change feed.
///
/// Inserts are deduplicated against the local collection (the sender's
/// view already holds its optimistic copy). Updates, deletes and lag
/// are handled by refetching the whole scope rather than diffing.
async fn run_conversation_watch(
    socket: SocketRef,
    state: Arc<AppState>,
    user_id: Uuid,
    peer_id: Uuid,
) {
    let scope = ChannelScope::Conversation { a: user_id, b: peer_id };
    let mut sub = state.feed.subscribe();

    let initial = match fetch_conversation(&state, user_id, peer_id) {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(error = %e, "failed to load conversation for watch");
            return;
        }
    };

    let mut coll = LiveCollection::from_items(initial);
    let _ = socket.emit("conversation_snapshot", &snapshot_payload(peer_id, &coll));

    while let Some(item) = sub.next().await {
        match item {
            FeedItem::Event(event) if scope.matches(&event) => match event.op {
                ChangeOp::Insert => {
                    match serde_json::from_value::<ChatMessage>(event.row.clone()) {
                        Ok(message) => {
                            // Duplicate delivery or optimistic copy: drop it.
                            if coll.apply_insert(message.clone()) {
                                let _ = socket.emit("conversation_message", &message);
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "malformed chat event row");
                        }
                    }
                }
                ChangeOp::Update | ChangeOp::Delete => {
                    resync(&socket, &state, user_id, peer_id, &mut coll).await;
                }
            },
            FeedItem::Event(_) => {}
            FeedItem::Lagged(skipped) => {
                tracing::warn!(skipped, "conversation watch lagged, resyncing");
                resync(&socket, &state, user_id, peer_id, &mut coll).await;
            }
        }
    }
}

async fn resync(
    socket: &SocketRef,
    state: &Arc<AppState>,
    user_id: Uuid,
    peer_id: Uuid,
    coll: &mut LiveCollection<ChatMessage>,
) {
    match fetch_conversation(state, user_id, peer_id) {
        Ok(fresh) => {
            coll.replace_all(fresh);
            let _ = socket.emit("conversation_snapshot", &snapshot_payload(peer_id, coll));
        }
        Err(e) => {
            coll.mark_stale();
            tracing::error!(error = %e, "conversation resync failed");
        }
    }
}

fn fetch_conversation(
    state: &Arc<AppState>,
    user_id: Uuid,
    peer_id: Uuid,
) -> anyhow::Result<Vec<ChatMessage>> {
    let mut conn = state.db.get()?;
    Ok(load_conversation(&mut conn, user_id, peer_id)?)
}

fn snapshot_payload(peer_id: Uuid, coll: &LiveCollection<ChatMessage>) -> serde_json::Value {
    serde_json::json!({
        "peer_id": peer_id,
        "messages": coll.items(),
    })
}

fn authenticate_socket(socket: &SocketRef, state: &Arc<AppState>) -> Result<Uuid, String> {
    let connect_info = socket.req_parts();

    // Extract token from query string ?token=xxx
    let query = connect_info.uri.query().unwrap_or_default();
    let token = query
        .split('&')
        .find_map(|pair| {
            let mut split = pair.splitn(2, '=');
            let key = split.next()?;
            let value = split.next()?;
            if key == "token" {
                Some(value.to_string())
            } else {
                None
            }
        })
        .ok_or_else(|| "missing token query parameter".to_string())?;

    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = jsonwebtoken::decode::<parko_shared::types::auth::Claims>(
        &token,
        &jsonwebtoken::DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("invalid token: {e}"))?;

    if token_data.claims.is_expired() {
        return Err("token has expired".into());
    }

    Ok(token_data.claims.sub)
}
