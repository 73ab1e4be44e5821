// src/handlers/tenants.rs

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
    handlers::status_change,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::{
        auth::StatusChangeResponse,
        tenant::{NewTenantPayload, TenantProfile, UpdateTenantPayload},
    },
};

// GET /api/microempresas
#[utoipa::path(
    get,
    path = "/api/microempresas",
    tag = "Microempresas",
    responses(
        (status = 200, description = "Todas as microempresas", body = Vec<TenantProfile>),
        (status = 403, description = "Apenas super usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tenants(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let tenants = app_state
        .tenant_service
        .list(session.actor().as_ref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(tenants)))
}

// POST /api/microempresas
#[utoipa::path(
    post,
    path = "/api/microempresas",
    tag = "Microempresas",
    request_body = NewTenantPayload,
    responses(
        (status = 201, description = "Microempresa criada já ativa", body = TenantProfile),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas super usuário"),
        (status = 409, description = "E-mail ou nome de negócio já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<NewTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .tenant_service
        .create_as(session.actor().as_ref(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

// GET /api/microempresas/{id}
#[utoipa::path(
    get,
    path = "/api/microempresas/{id}",
    tag = "Microempresas",
    params(("id" = Uuid, Path, description = "ID da microempresa")),
    responses(
        (status = 200, description = "Perfil da microempresa", body = TenantProfile),
        (status = 403, description = "Sem acesso a esta microempresa"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .tenant_service
        .get(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(tenant)))
}

// PUT /api/microempresas/{id}
#[utoipa::path(
    put,
    path = "/api/microempresas/{id}",
    tag = "Microempresas",
    params(("id" = Uuid, Path, description = "ID da microempresa")),
    request_body = UpdateTenantPayload,
    responses(
        (status = 200, description = "Perfil atualizado; o tipo de loja é recalculado", body = TenantProfile),
        (status = 400, description = "Dados inválidos ou e-mail alterado"),
        (status = 403, description = "Sem acesso a esta microempresa"),
        (status = 404, description = "Não encontrada"),
        (status = 409, description = "Nome de negócio já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .tenant_service
        .update(session.actor().as_ref(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(tenant)))
}

// PATCH /api/microempresas/{id}/deactivate
#[utoipa::path(
    patch,
    path = "/api/microempresas/{id}/deactivate",
    tag = "Microempresas",
    params(("id" = Uuid, Path, description = "ID da microempresa")),
    responses(
        (status = 200, description = "Desativada", body = StatusChangeResponse),
        (status = 403, description = "Sem acesso a esta microempresa"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .tenant_service
        .deactivate(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, tenant.tenant.id, tenant.tenant.status))))
}

// PATCH /api/microempresas/{id}/activate
#[utoipa::path(
    patch,
    path = "/api/microempresas/{id}/activate",
    tag = "Microempresas",
    params(("id" = Uuid, Path, description = "ID da microempresa")),
    responses(
        (status = 200, description = "Ativada", body = StatusChangeResponse),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn activate_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .tenant_service
        .activate(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, tenant.tenant.id, tenant.tenant.status))))
}

// DELETE /api/microempresas/{id}
#[utoipa::path(
    delete,
    path = "/api/microempresas/{id}",
    tag = "Microempresas",
    params(("id" = Uuid, Path, description = "ID da microempresa")),
    responses(
        (status = 200, description = "Desativada (exclusão lógica)", body = StatusChangeResponse),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .tenant_service
        .delete(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, tenant.tenant.id, tenant.tenant.status))))
}
