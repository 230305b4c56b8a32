use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{middleware, routing::{get, post}, Json, Router};
use common::audit::{audit_requests, AuditSink};
use common::types::Health;
use service::costs::domain::{AddCostRequest, CostItem, MonthlyReport, ReportQuery};
use service::costs::service::ReportService;
use service::errors::{codes, ServiceError};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub reports: ReportService,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn add_cost(
    State(state): State<AppState>,
    body: Result<Json<AddCostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CostItem>), ApiError> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!(error = %e, "rejected add-cost body");
        ServiceError::validation(codes::INVALID_JSON, "invalid JSON body")
    })?;
    let item = state.reports.add_cost_item(&body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<MonthlyReport>, ApiError> {
    let Query(q) = query.map_err(|e| {
        tracing::debug!(error = %e, "rejected report query");
        ServiceError::validation(codes::INVALID_QUERY, "invalid query string")
    })?;
    Ok(Json(state.reports.report(&q).await?))
}

/// Costs service router: health, cost intake and monthly reports, with
/// tracing, CORS and the audit trail around every request.
pub fn build_router(state: AppState, audit: AuditSink) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/add", post(add_cost))
        .route("/api/report", get(get_report))
        .with_state(state)
        .layer(middleware::from_fn_with_state(audit, audit_requests))
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
