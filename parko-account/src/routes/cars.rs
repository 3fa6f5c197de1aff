use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use parko_shared::errors::{AppError, AppResult, ErrorCode};
use parko_shared::types::auth::AuthUser;
use parko_shared::types::ApiResponse;

use crate::models::{Car, CarChanges, NewCar};
use crate::schema::cars;
use crate::services::plate::{normalize_plate, MIN_PLATE_QUERY_LEN};
use crate::services::qr::car_qr_payload;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCarRequest {
    #[validate(length(min = 3, max = 16))]
    pub plate_number: String,
    #[validate(length(min = 1, max = 60))]
    pub make: String,
    #[validate(length(min = 1, max = 60))]
    pub model: String,
    #[validate(length(max = 30))]
    pub color: Option<String>,
    #[validate(range(min = 1950, max = 2100))]
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCarRequest {
    #[validate(length(min = 1, max = 60))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub model: Option<String>,
    #[validate(length(max = 30))]
    pub color: Option<String>,
    #[validate(range(min = 1950, max = 2100))]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct QrPayloadResponse {
    pub payload: String,
}

/// GET /cars - the current user's registered cars
pub async fn list_my_cars(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Car>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let items = cars::table
        .filter(cars::owner_id.eq(user.id))
        .order(cars::created_at.desc())
        .load::<Car>(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

/// POST /cars - register a car
pub async fn register_car(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterCarRequest>,
) -> AppResult<Json<ApiResponse<Car>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let plate = normalize_plate(&req.plate_number);
    if plate.len() < MIN_PLATE_QUERY_LEN {
        return Err(AppError::new(
            ErrorCode::InvalidPlateNumber,
            "plate number is too short",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Plates are globally unique; the unique index backstops races.
    let taken: i64 = cars::table
        .filter(cars::plate_number.eq(&plate))
        .count()
        .get_result(&mut conn)?;

    if taken > 0 {
        return Err(AppError::new(
            ErrorCode::PlateAlreadyRegistered,
            "this plate number is already registered",
        ));
    }

    let new_car = NewCar {
        owner_id: user.id,
        plate_number: plate,
        make: req.make,
        model: req.model,
        color: req.color,
        year: req.year,
    };

    let car = diesel::insert_into(cars::table)
        .values(&new_car)
        .get_result::<Car>(&mut conn)
        .map_err(|e| {
            let err = AppError::Database(e);
            if err.is_unique_violation() {
                AppError::new(
                    ErrorCode::PlateAlreadyRegistered,
                    "this plate number is already registered",
                )
            } else {
                err
            }
        })?;

    tracing::info!(car_id = %car.id, owner = %user.id, plate = %car.plate_number, "car registered");

    Ok(Json(ApiResponse::ok(car)))
}

/// PUT /cars/:id - update a car (plate is immutable; re-register instead)
pub async fn update_car(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<Uuid>,
    Json(req): Json<UpdateCarRequest>,
) -> AppResult<Json<ApiResponse<Car>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let car = cars::table
        .find(car_id)
        .first::<Car>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CarNotFound, "car not found"))?;

    if car.owner_id != user.id {
        return Err(AppError::forbidden("you can only edit your own cars"));
    }

    let changes = CarChanges {
        make: req.make,
        model: req.model,
        color: req.color,
        year: req.year,
        updated_at: Utc::now(),
    };

    let updated = diesel::update(cars::table.find(car_id))
        .set(&changes)
        .get_result::<Car>(&mut conn)?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /cars/:id
pub async fn delete_car(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let car = cars::table
        .find(car_id)
        .first::<Car>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CarNotFound, "car not found"))?;

    if car.owner_id != user.id {
        return Err(AppError::forbidden("you can only delete your own cars"));
    }

    diesel::delete(cars::table.find(car_id)).execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": true }))))
}

/// GET /cars/:id/qr - QR payload for a car sticker
pub async fn car_qr(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<QrPayloadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let car = cars::table
        .find(car_id)
        .first::<Car>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CarNotFound, "car not found"))?;

    if car.owner_id != user.id {
        return Err(AppError::forbidden("you can only export your own cars"));
    }

    Ok(Json(ApiResponse::ok(QrPayloadResponse {
        payload: car_qr_payload(&car),
    })))
}
