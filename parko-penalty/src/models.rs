use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::penalties;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    Speeding,
    RedLight,
    IllegalParking,
    NoInsurance,
    PhoneUse,
    DrunkDriving,
    Other,
}

impl std::fmt::Display for PenaltyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PenaltyType::Speeding => "speeding",
            PenaltyType::RedLight => "red_light",
            PenaltyType::IllegalParking => "illegal_parking",
            PenaltyType::NoInsurance => "no_insurance",
            PenaltyType::PhoneUse => "phone_use",
            PenaltyType::DrunkDriving => "drunk_driving",
            PenaltyType::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PenaltyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speeding" => Ok(PenaltyType::Speeding),
            "red_light" => Ok(PenaltyType::RedLight),
            "illegal_parking" => Ok(PenaltyType::IllegalParking),
            "no_insurance" => Ok(PenaltyType::NoInsurance),
            "phone_use" => Ok(PenaltyType::PhoneUse),
            "drunk_driving" => Ok(PenaltyType::DrunkDriving),
            "other" => Ok(PenaltyType::Other),
            _ => Err(format!("unknown penalty type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Overdue,
    Contested,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Contested => "contested",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            "contested" => Ok(PaymentStatus::Contested),
            _ => Err(format!("unknown payment status: {s}")),
        }
    }
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = penalties)]
pub struct Penalty {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Option<Uuid>,
    pub plate_number: Option<String>,
    pub penalty_type: String,
    pub points: i32,
    pub fine_amount: Option<BigDecimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub payment_status: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = penalties)]
pub struct NewPenalty {
    pub user_id: Uuid,
    pub car_id: Option<Uuid>,
    pub plate_number: Option<String>,
    pub penalty_type: String,
    pub points: i32,
    pub fine_amount: Option<BigDecimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub payment_status: String,
    pub is_active: bool,
    pub description: Option<String>,
    pub location: Option<String>,
}
