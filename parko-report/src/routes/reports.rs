use axum::extract::{Multipart, Path, Query, State};
use axum::http::HeaderMap;
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

use crate::events::publisher;
use crate::models::{NewReport, Report, ReportType};
use crate::schema::reports;
use crate::services::resolver;
use crate::AppState;

const IDEMPOTENCY_TTL_SECS: u64 = 24 * 60 * 60;

// --- Request / Response DTOs ---

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReportRequest {
    pub report_type: String,
    pub reported_user_id: Option<Uuid>,
    #[validate(length(max = 16))]
    pub plate_number: Option<String>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResolveReportRequest {
    pub rating: Option<i32>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolvePreviewParams {
    pub plate: String,
}

#[derive(Debug, Serialize)]
pub struct ResolvePreviewResponse {
    pub user_id: Option<Uuid>,
}

// --- Idempotency ---

fn idempotency_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reserve the key in Redis. `Ok(None)` means this submission is fresh;
/// `Ok(Some(report))` is a replay of an already-persisted submission.
async fn check_idempotency(
    state: &Arc<AppState>,
    reporter_id: Uuid,
    key: &str,
) -> AppResult<Option<Report>> {
    let redis_key = format!("report:idem:{reporter_id}:{key}");

    let fresh = state
        .redis
        .set_nx(&redis_key, "pending", IDEMPOTENCY_TTL_SECS)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

    if fresh {
        return Ok(None);
    }

    let stored = state
        .redis
        .get(&redis_key)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

    match stored.as_deref().and_then(|v| Uuid::parse_str(v).ok()) {
        Some(report_id) => {
            let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
            let report = reports::table
                .find(report_id)
                .first::<Report>(&mut conn)
                .optional()?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::DuplicateReport, "duplicate submission")
                })?;
            Ok(Some(report))
        }
        // The original request reserved the key but has not finished
        // persisting yet.
        None => Err(AppError::new(
            ErrorCode::DuplicateReport,
            "a submission with this idempotency key is already in flight",
        )),
    }
}

async fn record_idempotency(state: &Arc<AppState>, reporter_id: Uuid, key: &str, report_id: Uuid) {
    let redis_key = format!("report:idem:{reporter_id}:{key}");
    if let Err(e) = state
        .redis
        .set(&redis_key, &report_id.to_string(), IDEMPOTENCY_TTL_SECS)
        .await
    {
        tracing::warn!(error = %e, "failed to record idempotency key");
    }
}

// --- Core submission path ---

struct Submission {
    report_type: ReportType,
    reported_user_id: Option<Uuid>,
    plate_number: String,
    comment: Option<String>,
    image_url: Option<String>,
}

/// Validate the target, resolve the plate when the target is unknown,
/// persist, publish, and record the idempotency key.
async fn submit(
    state: &Arc<AppState>,
    reporter: &AuthUser,
    report_type: &str,
    reported_user_id: Option<Uuid>,
    plate_number: Option<&str>,
    comment: Option<String>,
    image_url: Option<String>,
    idem_key: Option<String>,
) -> AppResult<(Report, Option<String>)> {
    let settings = state.settings.get().await;
    if settings.maintenance_mode {
        return Err(AppError::new(
            ErrorCode::ServiceUnavailable,
            "the platform is under maintenance",
        ));
    }
    if !settings.reports_enabled {
        return Err(AppError::forbidden("reports are currently disabled"));
    }

    let report_type = report_type
        .parse::<ReportType>()
        .map_err(|e| AppError::new(ErrorCode::InvalidReportType, e))?;

    let plate = resolver::stored_plate(reported_user_id, plate_number)
        .ok_or_else(|| {
            AppError::new(
                ErrorCode::ReportTargetMissing,
                "either a target user or a plate number is required",
            )
        })?;

    // Resolve the plate to a registered user when no target was given.
    let target = match reported_user_id {
        Some(id) => Some(id),
        None => {
            resolver::resolve_plate_to_user(
                &state.http_client,
                &state.config.account_service_url,
                &plate,
            )
            .await
        }
    };

    if target == Some(reporter.id) {
        return Err(AppError::new(ErrorCode::CannotReportSelf, "you cannot report yourself"));
    }

    if let Some(key) = &idem_key {
        if let Some(existing) = check_idempotency(state, reporter.id, key).await? {
            tracing::info!(report_id = %existing.id, "idempotent replay, returning original report");
            return Ok((existing, Some("duplicate submission ignored".to_string())));
        }
    }

    let submission = Submission {
        report_type,
        reported_user_id: target,
        plate_number: plate,
        comment,
        image_url,
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let new_report = NewReport {
        reporter_id: reporter.id,
        reported_user_id: submission.reported_user_id,
        plate_number: submission.plate_number,
        report_type: submission.report_type.to_string(),
        comment: submission.comment,
        image_url: submission.image_url,
        is_resolved: false,
    };

    let report: Report = diesel::insert_into(reports::table)
        .values(&new_report)
        .get_result(&mut conn)?;

    if let Some(key) = &idem_key {
        record_idempotency(state, reporter.id, key, report.id).await;
    }

    publisher::publish_report_created(
        &state.rabbitmq,
        report.id,
        report.reporter_id,
        report.reported_user_id,
        &report.plate_number,
        &report.report_type,
    )
    .await;

    tracing::info!(
        report_id = %report.id,
        reporter = %reporter.id,
        target = ?report.reported_user_id,
        plate = %report.plate_number,
        "report submitted"
    );

    Ok((report, None))
}

// --- Handlers ---

/// POST /reports - submit a report (image already uploaded, if any)
pub async fn submit_report(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SubmitReportRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let idem_key = idempotency_key(&headers);

    let (report, notice) = submit(
        &state,
        &user,
        &req.report_type,
        req.reported_user_id,
        req.plate_number.as_deref(),
        req.comment,
        req.image_url,
        idem_key,
    )
    .await?;

    let response = match notice {
        Some(msg) => ApiResponse::ok_with_message(report, msg),
        None => ApiResponse::ok(report),
    };
    Ok(Json(response))
}

/// POST /reports/with-evidence - multipart submission with a photo.
///
/// The photo is uploaded first; if the upload fails the report is still
/// persisted without it and the response carries a warning.
pub async fn submit_with_evidence(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Report>>> {
    let mut file_data: Option<(Vec<u8>, String)> = None;
    let mut report_type: Option<String> = None;
    let mut reported_user_id: Option<Uuid> = None;
    let mut plate_number: Option<String> = None;
    let mut comment: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("failed to read file: {e}")))?;
                file_data = Some((data.to_vec(), content_type));
            }
            "report_type" => {
                report_type = Some(field.text().await.unwrap_or_default());
            }
            "reported_user_id" => {
                let val = field.text().await.unwrap_or_default();
                reported_user_id = Uuid::parse_str(&val).ok();
            }
            "plate_number" => {
                let val = field.text().await.unwrap_or_default();
                if !val.trim().is_empty() {
                    plate_number = Some(val);
                }
            }
            "comment" => {
                let val = field.text().await.unwrap_or_default();
                if !val.trim().is_empty() {
                    comment = Some(val);
                }
            }
            _ => {}
        }
    }

    let report_type = report_type
        .ok_or_else(|| AppError::new(ErrorCode::InvalidReportType, "report_type is required"))?;

    // Upload evidence first; soft-fail into a warning.
    let mut upload_warning: Option<String> = None;
    let image_url = match file_data {
        Some((data, content_type)) => {
            let ext = match content_type.as_str() {
                "image/jpeg" | "image/jpg" => Some("jpg"),
                "image/png" => Some("png"),
                "image/webp" => Some("webp"),
                _ => None,
            };

            match ext {
                Some(ext) => {
                    let file_id = Uuid::now_v7();
                    let key = format!("evidence/{}/{}.{}", user.id, file_id, ext);
                    match state.minio.upload(&key, data, &content_type).await {
                        Ok(url) => Some(url),
                        Err(e) => {
                            tracing::warn!(error = %e, "evidence upload failed, submitting without image");
                            upload_warning =
                                Some("evidence upload failed; report submitted without image".to_string());
                            None
                        }
                    }
                }
                None => {
                    return Err(AppError::new(
                        ErrorCode::ValidationError,
                        "unsupported format, accepted: jpeg, png, webp",
                    ));
                }
            }
        }
        None => None,
    };

    let idem_key = idempotency_key(&headers);

    let (report, notice) = submit(
        &state,
        &user,
        &report_type,
        reported_user_id,
        plate_number.as_deref(),
        comment,
        image_url,
        idem_key,
    )
    .await?;

    let response = match notice.or(upload_warning) {
        Some(msg) => ApiResponse::ok_with_message(report, msg),
        None => ApiResponse::ok(report),
    };
    Ok(Json(response))
}

/// GET /resolve-plate?plate= - live resolution preview for the submit form
pub async fn resolve_preview(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolvePreviewParams>,
) -> AppResult<Json<ApiResponse<ResolvePreviewResponse>>> {
    let user_id = resolver::resolve_plate_to_user(
        &state.http_client,
        &state.config.account_service_url,
        &params.plate,
    )
    .await;

    Ok(Json(ApiResponse::ok(ResolvePreviewResponse { user_id })))
}

/// GET /reports/mine - reports the current user filed
pub async fn list_mine(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Report>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let items = reports::table
        .filter(reports::reporter_id.eq(user.id))
        .order(reports::created_at.desc())
        .load::<Report>(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

/// GET /reports/against-me - reports filed against the current user
pub async fn list_against_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Report>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let items = reports::table
        .filter(reports::reported_user_id.eq(user.id))
        .order(reports::created_at.desc())
        .load::<Report>(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

/// POST /reports/:id/resolve - the reported party closes a report.
///
/// Rating is mandatory; resolution happens exactly once.
pub async fn resolve_report(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<ResolveReportRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let rating = req
        .rating
        .ok_or_else(|| AppError::new(ErrorCode::RatingRequired, "a rating is required to resolve"))?;

    if !(1..=5).contains(&rating) {
        return Err(AppError::new(
            ErrorCode::RatingOutOfRange,
            "rating must be between 1 and 5",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let report = reports::table
        .find(report_id)
        .first::<Report>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))?;

    if report.reported_user_id != Some(user.id) {
        return Err(AppError::new(
            ErrorCode::NotReportedParty,
            "only the reported user can resolve this report",
        ));
    }

    if report.is_resolved {
        return Err(AppError::new(
            ErrorCode::ReportAlreadyResolved,
            "this report has already been resolved",
        ));
    }

    let updated: Report = diesel::update(reports::table.find(report_id))
        .set((
            reports::is_resolved.eq(true),
            reports::rating.eq(Some(rating)),
            reports::resolver_comment.eq(req.comment.clone()),
            reports::resolved_at.eq(Some(Utc::now())),
        ))
        .get_result(&mut conn)?;

    publisher::publish_report_resolved(
        &state.rabbitmq,
        updated.id,
        updated.reporter_id,
        user.id,
        rating,
    )
    .await;

    Ok(Json(ApiResponse::ok(updated)))
}
