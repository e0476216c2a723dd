use axum::{http::StatusCode, response::Json};
use serde_json::json;
use tracing::{error, warn};

use crate::store::StoreError;

pub const VALIDATION_ERRORS: &str = "validation errors";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),
    #[error("{0}")]
    InternalError(String),
}

impl ApiError {
    pub fn validation() -> Self {
        ApiError::Validation(vec![VALIDATION_ERRORS.to_string()])
    }
}

/// Storage failures other than validation are logged and reported without
/// their detail. `NotFound` lands here only where the handler did not expect it.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_validation() {
            warn!(error = %err, "rejected invalid input");
            return ApiError::validation();
        }
        error!(error = %err, "storage failure");
        ApiError::InternalError(INTERNAL_ERROR.to_string())
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, json!({ "errors": errors })),
            ApiError::InternalError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_storage_failure_hides_detail() {
        let err = ApiError::from(StoreError::Migration("table restaurants is locked".to_string()));

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_validation_kinds_share_one_message() {
        for err in [
            StoreError::PriceOutOfRange(0.0),
            StoreError::UnknownPizza(4),
            StoreError::UnknownRestaurant(4),
            StoreError::ConstraintViolation("CheckViolation".to_string()),
        ] {
            let (status, body) = body_of(ApiError::from(err)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "errors": ["validation errors"] }));
        }
    }
}
