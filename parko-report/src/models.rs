use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::reports;

/// Closed category set. Anything the form cannot name goes to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    WrongPark,
    BlockingExit,
    LightsOn,
    WindowOpen,
    FlatTire,
    Other,
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportType::WrongPark => "wrong_park",
            ReportType::BlockingExit => "blocking_exit",
            ReportType::LightsOn => "lights_on",
            ReportType::WindowOpen => "window_open",
            ReportType::FlatTire => "flat_tire",
            ReportType::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wrong_park" => Ok(ReportType::WrongPark),
            "blocking_exit" => Ok(ReportType::BlockingExit),
            "lights_on" => Ok(ReportType::LightsOn),
            "window_open" => Ok(ReportType::WindowOpen),
            "flat_tire" => Ok(ReportType::FlatTire),
            "other" => Ok(ReportType::Other),
            _ => Err(format!("unknown report type: {s}")),
        }
    }
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = reports)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Option<Uuid>,
    pub plate_number: String,
    pub report_type: String,
    pub comment: Option<String>,
    pub image_url: Option<String>,
    pub is_resolved: bool,
    pub rating: Option<i32>,
    pub resolver_comment: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub reported_user_id: Option<Uuid>,
    pub plate_number: String,
    pub report_type: String,
    pub comment: Option<String>,
    pub image_url: Option<String>,
    pub is_resolved: bool,
}
