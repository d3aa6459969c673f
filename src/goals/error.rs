use axum::{http::StatusCode, response::IntoResponse, Json};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

#[derive(Debug, thiserror::Error)]
pub enum OkrError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Cycle detected: {0}")]
    CycleDetected(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl OkrError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation_error",
            Self::CycleDetected(_) => "cycle_detected",
            Self::Database(_) => "database",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::CycleDetected(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OkrError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<DieselError> for OkrError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => Self::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Conflict(info.message().to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for OkrError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_and_not_found_stay_distinct() {
        let forbidden = OkrError::Forbidden("not owner".to_string());
        let missing = OkrError::NotFound("objective".to_string());
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_ne!(forbidden.kind(), missing.kind());
    }

    #[test]
    fn test_diesel_not_found_maps_to_not_found() {
        let err: OkrError = DieselError::NotFound.into();
        assert!(matches!(err, OkrError::NotFound(_)));
    }

    #[test]
    fn test_response_status() {
        let response = OkrError::Conflict("review exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
