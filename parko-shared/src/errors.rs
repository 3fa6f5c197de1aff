use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Account errors (profiles, cars)
/// - E2xxx: Penalty errors
/// - E3xxx: Report errors
/// - E4xxx: Social errors (friendships, chat)
/// - E5xxx: Admin errors (settings, roles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,
    PayloadTooLarge,

    // Account (E1xxx)
    ProfileNotFound,
    CarNotFound,
    PlateAlreadyRegistered,
    InvalidPlateNumber,
    PlateQueryTooShort,

    // Penalty (E2xxx)
    PenaltyNotFound,
    InvalidPenaltyType,
    PointsOutOfRange,
    InvalidFineAmount,
    PenaltyAlreadyPaid,

    // Report (E3xxx)
    ReportNotFound,
    InvalidReportType,
    ReportTargetMissing,
    CannotReportSelf,
    ReportAlreadyResolved,
    RatingRequired,
    RatingOutOfRange,
    NotReportedParty,
    EvidenceUploadFailed,
    DuplicateReport,

    // Social (E4xxx)
    FriendshipNotFound,
    FriendRequestAlreadyExists,
    CannotFriendSelf,
    NotFriendshipParty,
    InvalidFriendshipTransition,
    MessageNotFound,
    MessageEmpty,
    ChatDisabled,
    FriendRequestsDisabled,

    // Admin (E5xxx)
    SettingsNotFound,
    RoleNotFound,
    InvalidRole,
    CannotChangeOwnRole,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",
            Self::PayloadTooLarge => "E0009",

            // Account
            Self::ProfileNotFound => "E1001",
            Self::CarNotFound => "E1002",
            Self::PlateAlreadyRegistered => "E1003",
            Self::InvalidPlateNumber => "E1004",
            Self::PlateQueryTooShort => "E1005",

            // Penalty
            Self::PenaltyNotFound => "E2001",
            Self::InvalidPenaltyType => "E2002",
            Self::PointsOutOfRange => "E2003",
            Self::InvalidFineAmount => "E2004",
            Self::PenaltyAlreadyPaid => "E2005",

            // Report
            Self::ReportNotFound => "E3001",
            Self::InvalidReportType => "E3002",
            Self::ReportTargetMissing => "E3003",
            Self::CannotReportSelf => "E3004",
            Self::ReportAlreadyResolved => "E3005",
            Self::RatingRequired => "E3006",
            Self::RatingOutOfRange => "E3007",
            Self::NotReportedParty => "E3008",
            Self::EvidenceUploadFailed => "E3009",
            Self::DuplicateReport => "E3010",

            // Social
            Self::FriendshipNotFound => "E4001",
            Self::FriendRequestAlreadyExists => "E4002",
            Self::CannotFriendSelf => "E4003",
            Self::NotFriendshipParty => "E4004",
            Self::InvalidFriendshipTransition => "E4005",
            Self::MessageNotFound => "E4006",
            Self::MessageEmpty => "E4007",
            Self::ChatDisabled => "E4008",
            Self::FriendRequestsDisabled => "E4009",

            // Admin
            Self::SettingsNotFound => "E5001",
            Self::RoleNotFound => "E5002",
            Self::InvalidRole => "E5003",
            Self::CannotChangeOwnRole => "E5004",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidPlateNumber
            | Self::PlateQueryTooShort | Self::InvalidPenaltyType | Self::PointsOutOfRange
            | Self::InvalidFineAmount | Self::InvalidReportType | Self::ReportTargetMissing
            | Self::RatingRequired | Self::RatingOutOfRange | Self::MessageEmpty
            | Self::InvalidRole => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::ProfileNotFound | Self::CarNotFound | Self::PenaltyNotFound
            | Self::ReportNotFound | Self::FriendshipNotFound | Self::MessageNotFound
            | Self::SettingsNotFound | Self::RoleNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::CannotReportSelf | Self::NotReportedParty
            | Self::CannotFriendSelf | Self::NotFriendshipParty | Self::ChatDisabled
            | Self::FriendRequestsDisabled | Self::CannotChangeOwnRole => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::PlateAlreadyRegistered | Self::PenaltyAlreadyPaid | Self::ReportAlreadyResolved
            | Self::FriendRequestAlreadyExists | Self::DuplicateReport
            | Self::InvalidFriendshipTransition => StatusCode::CONFLICT,
            Self::EvidenceUploadFailed => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// True when the underlying diesel error is a unique-constraint violation.
    /// Duplicate friend requests and idempotency races are detected this way
    /// and downgraded to informational responses by the callers.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
