use axum::extract::{Path, Query, State};
use axum::Json;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use parko_shared::errors::{AppError, AppResult, ErrorCode};
use parko_shared::types::auth::AuthUser;
use parko_shared::types::pagination::{Paginated, PaginationParams};
use parko_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{NewPenalty, PaymentStatus, Penalty, PenaltyType};
use crate::schema::penalties;
use crate::services::ledger::{self, PointsSummary};
use crate::AppState;

// --- Request DTOs ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePenaltyRequest {
    pub penalty_type: String,
    #[validate(range(min = 0, max = 15))]
    pub points: i32,
    pub start_date: DateTime<Utc>,
    #[validate(range(min = 0.0))]
    pub fine_amount: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub car_id: Option<Uuid>,
    #[validate(length(max = 16))]
    pub plate_number: Option<String>,
    pub payment_status: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 300))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePenaltyRequest {
    pub penalty_type: Option<String>,
    #[validate(range(min = 0, max = 15))]
    pub points: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0))]
    pub fine_amount: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub payment_status: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 300))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub as_of: Option<DateTime<Utc>>,
}

// --- Helpers ---

fn parse_penalty_type(raw: &str) -> AppResult<PenaltyType> {
    raw.parse::<PenaltyType>()
        .map_err(|e| AppError::new(ErrorCode::InvalidPenaltyType, e))
}

fn parse_payment_status(raw: &str) -> AppResult<PaymentStatus> {
    raw.parse::<PaymentStatus>()
        .map_err(|e| AppError::Validation(e))
}

fn parse_fine(raw: Option<f64>) -> AppResult<Option<BigDecimal>> {
    raw.map(|v| {
        BigDecimal::try_from(v)
            .map_err(|_| AppError::new(ErrorCode::InvalidFineAmount, "fine amount is not a valid number"))
    })
    .transpose()
}

fn load_owned_penalty(
    conn: &mut diesel::pg::PgConnection,
    penalty_id: Uuid,
    user_id: Uuid,
) -> AppResult<Penalty> {
    let penalty = penalties::table
        .find(penalty_id)
        .first::<Penalty>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PenaltyNotFound, "penalty not found"))?;

    if penalty.user_id != user_id {
        return Err(AppError::forbidden("you can only manage your own penalties"));
    }

    Ok(penalty)
}

/// Shared by the owner and admin edit paths. `end_date` is always
/// rederived from the effective start date; it is not caller-writable.
pub(crate) fn apply_penalty_changes(
    conn: &mut diesel::pg::PgConnection,
    existing: &Penalty,
    req: &UpdatePenaltyRequest,
) -> AppResult<Penalty> {
    let penalty_type = match &req.penalty_type {
        Some(raw) => parse_penalty_type(raw)?.to_string(),
        None => existing.penalty_type.clone(),
    };

    let points = req.points.unwrap_or(existing.points);
    ledger::validate_points(points)
        .map_err(|e| AppError::new(ErrorCode::PointsOutOfRange, e))?;

    let payment_status = match &req.payment_status {
        Some(raw) => parse_payment_status(raw)?.to_string(),
        None => existing.payment_status.clone(),
    };

    let fine_amount = match parse_fine(req.fine_amount)? {
        Some(v) => Some(v),
        None => existing.fine_amount.clone(),
    };

    let start_date = req.start_date.unwrap_or(existing.start_date);

    let updated = diesel::update(penalties::table.find(existing.id))
        .set((
            penalties::penalty_type.eq(penalty_type),
            penalties::points.eq(points),
            penalties::fine_amount.eq(fine_amount),
            penalties::start_date.eq(start_date),
            penalties::end_date.eq(ledger::end_date_for(start_date)),
            penalties::due_date.eq(req.due_date.or(existing.due_date)),
            penalties::payment_status.eq(payment_status),
            penalties::description.eq(req.description.clone().or_else(|| existing.description.clone())),
            penalties::location.eq(req.location.clone().or_else(|| existing.location.clone())),
        ))
        .get_result::<Penalty>(conn)?;

    Ok(updated)
}

// --- Handlers ---

/// GET /penalties - the current user's penalties, newest first
pub async fn list_my_penalties(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Penalty>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total: i64 = penalties::table
        .filter(penalties::user_id.eq(user.id))
        .select(count_star())
        .first(&mut conn)?;

    let items = penalties::table
        .filter(penalties::user_id.eq(user.id))
        .order(penalties::start_date.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<Penalty>(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

/// POST /penalties - record a penalty
pub async fn create_penalty(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePenaltyRequest>,
) -> AppResult<Json<ApiResponse<Penalty>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let penalty_type = parse_penalty_type(&req.penalty_type)?;
    ledger::validate_points(req.points)
        .map_err(|e| AppError::new(ErrorCode::PointsOutOfRange, e))?;
    let fine_amount = parse_fine(req.fine_amount)?;

    let payment_status = match &req.payment_status {
        Some(raw) => parse_payment_status(raw)?,
        None => PaymentStatus::Unpaid,
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let new_penalty = NewPenalty {
        user_id: user.id,
        car_id: req.car_id,
        plate_number: req.plate_number,
        penalty_type: penalty_type.to_string(),
        points: req.points,
        fine_amount,
        start_date: req.start_date,
        end_date: ledger::end_date_for(req.start_date),
        due_date: req.due_date,
        payment_status: payment_status.to_string(),
        is_active: true,
        description: req.description,
        location: req.location,
    };

    let penalty: Penalty = diesel::insert_into(penalties::table)
        .values(&new_penalty)
        .get_result(&mut conn)?;

    publisher::publish_penalty_created(
        &state.rabbitmq,
        penalty.id,
        penalty.user_id,
        &penalty.penalty_type,
        penalty.points,
    )
    .await;

    tracing::info!(
        penalty_id = %penalty.id,
        user_id = %user.id,
        points = penalty.points,
        "penalty recorded"
    );

    Ok(Json(ApiResponse::ok(penalty)))
}

/// GET /penalties/summary - accrued points and progress indicator
pub async fn points_summary(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<ApiResponse<PointsSummary>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows = penalties::table
        .filter(penalties::user_id.eq(user.id))
        .load::<Penalty>(&mut conn)?;

    let as_of = params.as_of.unwrap_or_else(Utc::now);
    Ok(Json(ApiResponse::ok(ledger::summarize(as_of, &rows))))
}

/// PUT /penalties/:id - edit an own penalty
pub async fn update_penalty(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(penalty_id): Path<Uuid>,
    Json(req): Json<UpdatePenaltyRequest>,
) -> AppResult<Json<ApiResponse<Penalty>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = load_owned_penalty(&mut conn, penalty_id, user.id)?;
    let updated = apply_penalty_changes(&mut conn, &existing, &req)?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /penalties/:id
pub async fn delete_penalty(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(penalty_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    load_owned_penalty(&mut conn, penalty_id, user.id)?;
    diesel::delete(penalties::table.find(penalty_id)).execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": true }))))
}

/// POST /penalties/:id/pay - mark a penalty paid
///
/// Idempotent in effect: paying an already-paid penalty refreshes the
/// payment timestamp rather than failing.
pub async fn mark_paid(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(penalty_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Penalty>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = load_owned_penalty(&mut conn, penalty_id, user.id)?;
    let already_paid = existing.payment_status == PaymentStatus::Paid.to_string();

    let updated: Penalty = diesel::update(penalties::table.find(penalty_id))
        .set((
            penalties::payment_status.eq(PaymentStatus::Paid.to_string()),
            penalties::payment_date.eq(Some(Utc::now())),
        ))
        .get_result(&mut conn)?;

    if !already_paid {
        publisher::publish_penalty_paid(&state.rabbitmq, updated.id, updated.user_id).await;
    }

    Ok(Json(ApiResponse::ok(updated)))
}
