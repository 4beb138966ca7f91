//! Analytics Routes
//!
//! - GET /api/v1/analytics/snapshot - Latest published metrics
//! - GET /api/v1/analytics/summary - Quick summary figures
//! - POST /api/v1/analytics/refresh - One-shot point-query refresh

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{SnapshotResponse, SummaryResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/analytics/snapshot
///
/// Returns the latest published metrics. Served from memory without any
/// store I/O; during a feed outage the response carries `stale: true`.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<SnapshotResponse> {
    let snapshot = state.engine.snapshot();
    Json(SnapshotResponse::from(snapshot.as_ref()))
}

/// GET /api/v1/analytics/summary
///
/// Condensed figures for dashboard tiles.
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let snapshot = state.engine.snapshot();
    Json(SummaryResponse::from(snapshot.as_ref()))
}

/// POST /api/v1/analytics/refresh
///
/// Re-pulls the query-derived metrics through the point-query
/// collaborator and returns the merged snapshot. A failed query or a
/// disconnected feed is reported to this caller only; the cached
/// snapshot keeps being served either way.
pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<Json<SnapshotResponse>> {
    let snapshot = state.engine.refresh().await?;
    Ok(Json(SnapshotResponse::from(snapshot.as_ref())))
}
