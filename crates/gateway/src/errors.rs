use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use thiserror::Error;
use tracing::error;

use crate::routing::Target;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid JSON body")]
    InvalidJson,
    #[error("request body too large")]
    BodyTooLarge,
    #[error("Invalid payload for /api/add")]
    InvalidAddPayload,
    #[error("route not found")]
    RouteNotFound,
    #[error("upstream timed out")]
    UpstreamTimeout { target: Target },
    #[error("upstream unreachable")]
    UpstreamUnreachable { target: Target },
    #[error("Gateway error")]
    Internal(String),
}

impl GatewayError {
    pub fn code(&self) -> u16 {
        match self {
            GatewayError::InvalidJson => 4000,
            GatewayError::InvalidAddPayload => 4001,
            GatewayError::RouteNotFound => 4040,
            GatewayError::BodyTooLarge => 4130,
            GatewayError::Internal(_) => 5000,
            GatewayError::UpstreamUnreachable { .. } => 5002,
            GatewayError::UpstreamTimeout { .. } => 5003,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidJson | GatewayError::InvalidAddPayload => StatusCode::BAD_REQUEST,
            GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamTimeout { .. } | GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Internal(detail) = &self {
            error!(service = "gateway", event = "internal_error", error = %detail, "gateway error");
        }
        (self.status(), Json(ErrorBody::new(self.code(), self.to_string()))).into_response()
    }
}
