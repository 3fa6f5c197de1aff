use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parko_shared::live::Keyed;

use crate::schema::{chat_messages, friendships};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

impl std::fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Blocked => "blocked",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            "blocked" => Ok(FriendshipStatus::Blocked),
            _ => Err(format!("unknown friendship status: {s}")),
        }
    }
}

// --- Friendship ---

#[derive(Debug, Queryable, Identifiable, Serialize, Deserialize, Clone)]
#[diesel(table_name = friendships)]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    pub fn touches(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.addressee_id == user_id
    }
}

impl Keyed for Friendship {
    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
pub struct NewFriendship {
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: String,
}

// --- ChatMessage ---

#[derive(Debug, Queryable, Identifiable, Serialize, Deserialize, Clone)]
#[diesel(table_name = chat_messages)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Keyed for ChatMessage {
    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = chat_messages)]
pub struct NewChatMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
}
