// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
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
        customer::{Customer, CustomerFilter, NewCustomerPayload, UpdateCustomerPayload},
    },
};

// GET /api/clientes
#[utoipa::path(
    get,
    path = "/api/clientes",
    tag = "Clientes",
    params(CustomerFilter),
    responses(
        (status = 200, description = "Clientes visíveis para a sessão", body = Vec<Customer>),
        (status = 403, description = "Clientes não listam clientes")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .customer_service
        .list(session.actor().as_ref(), filter.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(customers)))
}

// POST /api/clientes
#[utoipa::path(
    post,
    path = "/api/clientes",
    tag = "Clientes",
    request_body = NewCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos ou microempresa inativa"),
        (status = 403, description = "Sem permissão"),
        (status = 409, description = "E-mail já cadastrado nesta microempresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Json(payload): Json<NewCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .create_as(session.actor().as_ref(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/clientes/{id}
#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 403, description = "Sem acesso a este cliente"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .get(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(customer)))
}

// PUT /api/clientes/{id}
#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 400, description = "Dados inválidos, e-mail ou tipo alterado"),
        (status = 403, description = "Sem acesso a este cliente"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .update(session.actor().as_ref(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(customer)))
}

// PATCH /api/clientes/{id}/deactivate
#[utoipa::path(
    patch,
    path = "/api/clientes/{id}/deactivate",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Desativado", body = StatusChangeResponse),
        (status = 403, description = "Sem acesso a este cliente"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .deactivate(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, customer.id, customer.status))))
}

// PATCH /api/clientes/{id}/activate
#[utoipa::path(
    patch,
    path = "/api/clientes/{id}/activate",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Ativado", body = StatusChangeResponse),
        (status = 403, description = "Apenas super usuário ou a microempresa dona"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn activate_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .activate(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, customer.id, customer.status))))
}

// DELETE /api/clientes/{id}
#[utoipa::path(
    delete,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Desativado (exclusão lógica)", body = StatusChangeResponse),
        (status = 403, description = "Apenas super usuário ou a microempresa dona"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .delete(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(status_change(&app_state, &locale, customer.id, customer.status))))
}
