// src/handlers/plans.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::plan::{CreatePlanPayload, LegacyPlanList, Plan, PlanWithFeatures, UpdatePlanPayload},
};

// =============================================================================
//  ÁREA 1: VITRINE PÚBLICA
// =============================================================================

// GET /api/plans
#[utoipa::path(
    get,
    path = "/api/plans",
    tag = "Planes",
    responses((status = 200, description = "Planos ativos, do mais barato ao mais caro", body = Vec<PlanWithFeatures>))
)]
pub async fn list_public_plans(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .plan_service
        .list_public()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(plans)))
}

// GET /api/planes (formato antigo: {"planes": [...]})
#[utoipa::path(
    get,
    path = "/api/planes",
    tag = "Planes",
    responses((status = 200, description = "Planos ativos no formato legado", body = LegacyPlanList))
)]
pub async fn list_legacy_plans(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let planes = app_state
        .plan_service
        .list_public()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(LegacyPlanList { planes })))
}

// =============================================================================
//  ÁREA 2: ADMINISTRAÇÃO
// =============================================================================

// GET /api/admin/plans
#[utoipa::path(
    get,
    path = "/api/admin/plans",
    tag = "Planes",
    responses(
        (status = 200, description = "Todos os planos, inclusive inativos", body = Vec<PlanWithFeatures>),
        (status = 403, description = "Apenas super usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_all_plans(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .plan_service
        .list_all(session.actor().as_ref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(plans)))
}

// POST /api/admin/plans
#[utoipa::path(
    post,
    path = "/api/admin/plans",
    tag = "Planes",
    request_body = CreatePlanPayload,
    responses(
        (status = 201, description = "Plano criado", body = PlanWithFeatures),
        (status = 400, description = "Nome ausente, preço inválido ou características fora do limite"),
        (status = 403, description = "Apenas super usuário"),
        (status = 409, description = "Nome de plano já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<CreatePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .create(session.actor().as_ref(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, Json(plan)))
}

// PATCH /api/admin/plans/{id}
#[utoipa::path(
    patch,
    path = "/api/admin/plans/{id}",
    tag = "Planes",
    params(("id" = Uuid, Path, description = "ID do plano")),
    request_body = UpdatePlanPayload,
    responses(
        (status = 200, description = "Plano atualizado", body = PlanWithFeatures),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Plano não encontrado"),
        (status = 409, description = "Nome de plano já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .update(session.actor().as_ref(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(plan)))
}

// DELETE /api/admin/plans/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/plans/{id}",
    tag = "Planes",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano desativado (exclusão lógica)", body = Plan),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .plan_service
        .delete(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(plan)))
}
