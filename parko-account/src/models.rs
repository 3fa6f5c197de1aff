use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{cars, profiles};

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// --- Car ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = cars)]
pub struct Car {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plate_number: String,
    pub make: String,
    pub model: String,
    pub color: Option<String>,
    pub year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cars)]
pub struct NewCar {
    pub owner_id: Uuid,
    pub plate_number: String,
    pub make: String,
    pub model: String,
    pub color: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = cars)]
pub struct CarChanges {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year: Option<i32>,
    pub updated_at: DateTime<Utc>,
}
