// src/handlers/password_reset.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::{
        auth::{MessageResponse, SelectRoleResponse},
        password_reset::{ResetConfirmPayload, ResetRequestPayload, ResetRequestedResponse},
    },
    services::password_reset_service::{ResetConfirmation, ResetRequestOutcome},
};

// POST /api/password-reset/request (alias /api/password/forgot)
#[utoipa::path(
    post,
    path = "/api/password-reset/request",
    tag = "Password Reset",
    request_body = ResetRequestPayload,
    responses(
        (status = 200, description = "Token enviado por e-mail, ou `select_role` se o e-mail tiver vários papéis", body = ResetRequestedResponse),
        (status = 400, description = "E-mail ausente ou papel não disponível"),
        (status = 404, description = "Nenhuma conta com esse e-mail"),
        (status = 500, description = "Falha no envio do e-mail")
    )
)]
pub async fn request_reset(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ResetRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .password_reset_service
        .request(payload.email.as_deref(), payload.role.as_deref(), &locale.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = match outcome {
        ResetRequestOutcome::Sent(role) => {
            let message = app_state.i18n_store.translate(&locale.0, "password_reset.sent");
            (StatusCode::OK, Json(ResetRequestedResponse { message, role })).into_response()
        }
        ResetRequestOutcome::SelectRole(roles) => {
            let body = SelectRoleResponse {
                select_role: true,
                roles,
                message: app_state.i18n_store.translate(&locale.0, "auth.select_role"),
                tenants: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
    };
    Ok(response)
}

// POST /api/password-reset/confirm (alias /api/password/reset)
#[utoipa::path(
    post,
    path = "/api/password-reset/confirm",
    tag = "Password Reset",
    request_body = ResetConfirmPayload,
    responses(
        (status = 200, description = "Senha atualizada", body = MessageResponse),
        (status = 400, description = "Campos ausentes, senha fraca ou token inválido/expirado"),
        (status = 404, description = "Conta não encontrada")
    )
)]
pub async fn confirm_reset(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ResetConfirmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let input = ResetConfirmation {
        email: payload.email.as_deref(),
        role: payload.role.as_deref(),
        token: payload.token.as_deref(),
        new_password: payload.new_password.as_deref(),
        confirm_password: payload.confirm_password.as_deref(),
    };

    app_state
        .password_reset_service
        .confirm(input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "password_reset.done");
    Ok((StatusCode::OK, Json(MessageResponse { message })))
}
