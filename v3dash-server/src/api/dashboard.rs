//! GET /api/dashboard: view-models for the dashboard home page

use axum::{extract::State, routing::get, Json, Router};
use v3dash_common::presentation::DashboardView;

use crate::api::{success, ApiResponse};
use crate::db::documents;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/dashboard
///
/// Gauge, missing-info list, document table and activity summary in one call.
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<DashboardView>>> {
    let latest = documents::get_latest_document(&state.db).await?;
    let stats = documents::compute_stats(&state.db).await?;

    Ok(success(DashboardView::build(latest.as_ref(), &stats)))
}

/// Build dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}
