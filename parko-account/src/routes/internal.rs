use axum::extract::{Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use parko_shared::errors::{AppError, AppResult};

use crate::schema::cars;
use crate::services::plate::lookup_pattern;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolvePlateParams {
    pub plate: String,
}

#[derive(Debug, Serialize)]
pub struct ResolvePlateResponse {
    pub user_id: Option<Uuid>,
}

/// GET /internal/resolve-plate?plate=X
///
/// Service-to-service lookup of a plate's registered owner. Queries
/// shorter than the minimum resolve to nothing without touching the
/// database; the pattern is escaped so `%`/`_`/`\` in user input cannot
/// widen the ILIKE match.
pub async fn resolve_plate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolvePlateParams>,
) -> AppResult<Json<ResolvePlateResponse>> {
    let Some(pattern) = lookup_pattern(&params.plate) else {
        tracing::debug!(plate = %params.plate, "plate query too short, skipping lookup");
        return Ok(Json(ResolvePlateResponse { user_id: None }));
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let owner: Option<Uuid> = cars::table
        .filter(cars::plate_number.ilike(&pattern))
        .select(cars::owner_id)
        .first::<Uuid>(&mut conn)
        .optional()?;

    Ok(Json(ResolvePlateResponse { user_id: owner }))
}
