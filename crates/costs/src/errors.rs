use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::errors::{codes, ServiceError};
use tracing::error;

/// HTTP face of [`ServiceError`]: every failure becomes `{id, message}`.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            ServiceError::Validation { code, message } => (StatusCode::BAD_REQUEST, ErrorBody::new(code, message)),
            ServiceError::NotFound { code, message } => (StatusCode::NOT_FOUND, ErrorBody::new(code, message)),
            ServiceError::Conflict { code, message } => (StatusCode::CONFLICT, ErrorBody::new(code, message)),
            ServiceError::Upstream { code, message } => (StatusCode::BAD_GATEWAY, ErrorBody::new(code, message)),
            e @ (ServiceError::Db(_) | ServiceError::Internal(_)) => {
                error!(error = %e, event = "internal_error", "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(codes::INTERNAL, "Internal Server Error"))
            }
        };
        (status, Json(body)).into_response()
    }
}
