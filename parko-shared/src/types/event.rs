use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `parko.{domain}.{entity}.{action}`
/// Example: `parko.report.report.created`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Penalty events
    pub const PENALTY_CREATED: &str = "parko.penalty.penalty.created";
    pub const PENALTY_PAID: &str = "parko.penalty.penalty.paid";
    pub const PENALTY_EXPIRED: &str = "parko.penalty.penalty.expired";

    // Report events
    pub const REPORT_CREATED: &str = "parko.report.report.created";
    pub const REPORT_RESOLVED: &str = "parko.report.report.resolved";

    // Admin events
    pub const SETTINGS_UPDATED: &str = "parko.admin.settings.updated";
    pub const ROLE_GRANTED: &str = "parko.admin.role.granted";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PenaltyCreated {
        pub penalty_id: Uuid,
        pub user_id: Uuid,
        pub penalty_type: String,
        pub points: i32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PenaltyPaid {
        pub penalty_id: Uuid,
        pub user_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PenaltyExpired {
        pub penalty_id: Uuid,
        pub user_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportCreated {
        pub report_id: Uuid,
        pub reporter_id: Uuid,
        pub reported_user_id: Option<Uuid>,
        pub plate_number: String,
        pub report_type: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportResolved {
        pub report_id: Uuid,
        pub reporter_id: Uuid,
        pub resolved_by: Uuid,
        pub rating: i32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SettingsUpdated {
        pub updated_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RoleGranted {
        pub user_id: Uuid,
        pub role: String,
        pub granted_by: Uuid,
    }
}
