use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use parko_shared::settings::PlatformSettings;

use crate::schema::{admin_actions, platform_settings, user_roles};

// --- PlatformSettings ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = platform_settings)]
pub struct PlatformSettingsRow {
    pub id: Uuid,
    pub reports_enabled: bool,
    pub chat_enabled: bool,
    pub friend_requests_enabled: bool,
    pub maintenance_mode: bool,
    pub emergency_police: String,
    pub emergency_ambulance: String,
    pub emergency_fire: String,
    pub emergency_road_assist: String,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PlatformSettingsRow> for PlatformSettings {
    fn from(row: &PlatformSettingsRow) -> Self {
        Self {
            reports_enabled: row.reports_enabled,
            chat_enabled: row.chat_enabled,
            friend_requests_enabled: row.friend_requests_enabled,
            maintenance_mode: row.maintenance_mode,
            emergency_police: row.emergency_police.clone(),
            emergency_ambulance: row.emergency_ambulance.clone(),
            emergency_fire: row.emergency_fire.clone(),
            emergency_road_assist: row.emergency_road_assist.clone(),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = platform_settings)]
pub struct NewPlatformSettingsRow {
    pub reports_enabled: bool,
    pub chat_enabled: bool,
    pub friend_requests_enabled: bool,
    pub maintenance_mode: bool,
    pub emergency_police: String,
    pub emergency_ambulance: String,
    pub emergency_fire: String,
    pub emergency_road_assist: String,
    pub updated_by: Option<Uuid>,
}

impl NewPlatformSettingsRow {
    pub fn defaults() -> Self {
        let d = PlatformSettings::default();
        Self {
            reports_enabled: d.reports_enabled,
            chat_enabled: d.chat_enabled,
            friend_requests_enabled: d.friend_requests_enabled,
            maintenance_mode: d.maintenance_mode,
            emergency_police: d.emergency_police,
            emergency_ambulance: d.emergency_ambulance,
            emergency_fire: d.emergency_fire,
            emergency_road_assist: d.emergency_road_assist,
            updated_by: None,
        }
    }
}

// --- UserRole ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = user_roles)]
pub struct UserRoleRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub granted_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_roles)]
pub struct NewUserRoleRow {
    pub user_id: Uuid,
    pub role: String,
    pub granted_by: Uuid,
}

// --- AdminAction ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = admin_actions)]
pub struct AdminAction {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = admin_actions)]
pub struct NewAdminAction {
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}
