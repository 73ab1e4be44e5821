// src/handlers/admins.rs

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
    handlers::status_change,
    models::{
        admin::{Admin, NewAdminPayload, UpdateAdminPayload},
        auth::StatusChangeResponse,
    },
};

// GET /api/admins
#[utoipa::path(
    get,
    path = "/api/admins",
    tag = "Admins",
    responses(
        (status = 200, description = "Super usuários", body = Vec<Admin>),
        (status = 403, description = "Apenas super usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_admins(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let admins = app_state
        .admin_service
        .list(session.actor().as_ref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(admins)))
}

// POST /api/admins
#[utoipa::path(
    post,
    path = "/api/admins",
    tag = "Admins",
    request_body = NewAdminPayload,
    responses(
        (status = 201, description = "Super usuário criado", body = Admin),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas super usuário"),
        (status = 409, description = "E-mail já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<NewAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = app_state
        .admin_service
        .create(session.actor().as_ref(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, Json(admin)))
}

// PUT /api/admins/{id}
#[utoipa::path(
    put,
    path = "/api/admins/{id}",
    tag = "Admins",
    params(("id" = Uuid, Path, description = "ID do super usuário")),
    request_body = UpdateAdminPayload,
    responses(
        (status = 200, description = "Super usuário atualizado", body = Admin),
        (status = 400, description = "Dados inválidos ou e-mail alterado"),
        (status = 403, description = "Sem permissão ou tentativa de se desativar"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = app_state
        .admin_service
        .update(session.actor().as_ref(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(admin)))
}

// PATCH /api/admins/{id}/activate
#[utoipa::path(
    patch,
    path = "/api/admins/{id}/activate",
    tag = "Admins",
    params(("id" = Uuid, Path, description = "ID do super usuário")),
    responses(
        (status = 200, description = "Ativado", body = StatusChangeResponse),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn activate_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = app_state
        .admin_service
        .activate(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, admin.id, admin.status))))
}

// DELETE /api/admins/{id}
#[utoipa::path(
    delete,
    path = "/api/admins/{id}",
    tag = "Admins",
    params(("id" = Uuid, Path, description = "ID do super usuário")),
    responses(
        (status = 200, description = "Desativado (exclusão lógica)", body = StatusChangeResponse),
        (status = 403, description = "Sem permissão ou tentativa de excluir a si mesmo"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = app_state
        .admin_service
        .delete(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, admin.id, admin.status))))
}
