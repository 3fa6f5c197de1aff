//! Channel scoping for the realtime feed.
//!
//! A socket consumer watches one scope at a time; events outside the
//! scope are dropped before they reach the wire. Scopes are matched on
//! the row JSON carried by the event, so no extra queries are needed.

use serde::Serialize;
use uuid::Uuid;

use parko_shared::live::{ChangeEvent, ChangeFeed, ChangeOp, Keyed};

pub const CHAT_MESSAGES_TABLE: &str = "chat_messages";
pub const FRIENDSHIPS_TABLE: &str = "friendships";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelScope {
    /// Messages between exactly these two users, in either direction.
    Conversation { a: Uuid, b: Uuid },
    /// Friendship rows touching this user on either side.
    FriendshipsOf { user: Uuid },
}

impl ChannelScope {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        match self {
            ChannelScope::Conversation { a, b } => {
                if event.table != CHAT_MESSAGES_TABLE {
                    return false;
                }
                let sender = field_uuid(&event.row, "sender_id");
                let receiver = field_uuid(&event.row, "receiver_id");
                match (sender, receiver) {
                    (Some(s), Some(r)) => (s == *a && r == *b) || (s == *b && r == *a),
                    _ => false,
                }
            }
            ChannelScope::FriendshipsOf { user } => {
                if event.table != FRIENDSHIPS_TABLE {
                    return false;
                }
                field_uuid(&event.row, "requester_id") == Some(*user)
                    || field_uuid(&event.row, "addressee_id") == Some(*user)
            }
        }
    }
}

fn field_uuid(row: &serde_json::Value, field: &str) -> Option<Uuid> {
    row.get(field)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Serialize a row and push it onto the feed.
pub fn emit_row<T: Serialize + Keyed>(feed: &ChangeFeed, table: &str, op: ChangeOp, row: &T) {
    let value = serde_json::to_value(row).unwrap_or(serde_json::Value::Null);
    feed.emit(ChangeEvent {
        table: table.to_string(),
        op,
        row_id: row.key(),
        row: value,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use chrono::Utc;
    use parko_shared::live::LiveCollection;

    fn message(sender: Uuid, receiver: Uuid) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            content: "hey".to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    fn insert_event(msg: &ChatMessage) -> ChangeEvent {
        ChangeEvent::insert(
            CHAT_MESSAGES_TABLE,
            msg.id,
            serde_json::to_value(msg).unwrap(),
        )
    }

    #[test]
    fn conversation_matches_both_directions() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let scope = ChannelScope::Conversation { a, b };

        assert!(scope.matches(&insert_event(&message(a, b))));
        assert!(scope.matches(&insert_event(&message(b, a))));
    }

    #[test]
    fn conversation_excludes_third_parties() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let scope = ChannelScope::Conversation { a, b };

        assert!(!scope.matches(&insert_event(&message(a, c))));
        assert!(!scope.matches(&insert_event(&message(c, b))));
    }

    #[test]
    fn conversation_ignores_other_tables() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let scope = ChannelScope::Conversation { a, b };
        let msg = message(a, b);

        let event = ChangeEvent::insert(FRIENDSHIPS_TABLE, msg.id, serde_json::to_value(&msg).unwrap());
        assert!(!scope.matches(&event));
    }

    #[test]
    fn friendships_scope_matches_either_side() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let scope = ChannelScope::FriendshipsOf { user };

        let row = serde_json::json!({
            "id": Uuid::new_v4(),
            "requester_id": other,
            "addressee_id": user,
            "status": "pending",
        });
        let event = ChangeEvent::insert(FRIENDSHIPS_TABLE, Uuid::new_v4(), row);
        assert!(scope.matches(&event));

        let unrelated = serde_json::json!({
            "id": Uuid::new_v4(),
            "requester_id": Uuid::new_v4(),
            "addressee_id": Uuid::new_v4(),
            "status": "pending",
        });
        let event = ChangeEvent::insert(FRIENDSHIPS_TABLE, Uuid::new_v4(), unrelated);
        assert!(!scope.matches(&event));
    }

    #[test]
    fn duplicate_delivery_yields_one_copy() {
        // Simulates the optimistic-insert-then-feed-delivery race: the
        // same insert event applied twice leaves exactly one message.
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let msg = message(a, b);
        let event = insert_event(&msg);

        let mut coll: LiveCollection<ChatMessage> = LiveCollection::new();

        let first: ChatMessage = serde_json::from_value(event.row.clone()).unwrap();
        let second: ChatMessage = serde_json::from_value(event.row.clone()).unwrap();

        assert!(coll.apply_insert(first));
        assert!(!coll.apply_insert(second));
        assert_eq!(coll.len(), 1);
    }
}
