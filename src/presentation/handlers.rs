// HTTP request handlers
use crate::application::dashboard_builder::build_dashboard;
use crate::application::pageload_panel::PanelState;
use crate::domain::params::DashboardParams;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Name under which the scripted dashboard is served
pub const SCRIPTED_DASHBOARD: &str = "devel";

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Build the scripted dashboard from URL parameters
pub async fn get_dashboard(Path(name): Path<String>, Query(params): Query<DashboardParams>) -> Response {
    if name != SCRIPTED_DASHBOARD {
        return (StatusCode::NOT_FOUND, format!("unknown dashboard '{}'", name)).into_response();
    }
    Json(build_dashboard(&params)).into_response()
}

/// Current pageload panel state
pub async fn get_pageload_panel(State(state): State<Arc<AppState>>) -> Json<PanelState> {
    Json(state.runner.snapshot().await)
}

/// Send a refresh signal to the pageload panel
pub async fn refresh_pageload_panel(State(state): State<Arc<AppState>>) -> StatusCode {
    // Detached; the result is published through the panel state
    let _ = state.runner.refresh();
    StatusCode::ACCEPTED
}
