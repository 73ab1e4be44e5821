// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::dashboard::DashboardSummary,
};

// GET /api/dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Resumo conforme o papel ativo (`role` indica a variante)", body = DashboardSummary),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let principal = session.principal.as_ref().ok_or_else(|| to_api(AppError::NotAuthenticated))?;
    let summary = app_state.dashboard_service.summary(principal).await.map_err(to_api)?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Serviço no ar"))
)]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
