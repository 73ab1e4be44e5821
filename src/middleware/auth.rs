// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    services::{auth::Session, authorization::Actor},
};

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
}

fn reject(app_state: &AppState, headers: &HeaderMap, err: AppError) -> ApiError {
    err.to_api_error(&Locale::from_headers(headers), &app_state.i18n_store)
}

/// Guarda das rotas autenticadas: exige um JWT de principal (visitante não passa)
/// e deixa a `Session` nos extensions.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| reject(&app_state, request.headers(), AppError::NotAuthenticated))?;

    let session = app_state
        .auth_service
        .authenticate(&token)
        .await
        .map_err(|e| reject(&app_state, request.headers(), e))?;

    if session.is_guest() {
        return Err(reject(&app_state, request.headers(), AppError::NotAuthenticated));
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Sessão de um principal, colocada pelo `auth_guard`.
pub struct CurrentSession(pub Session);

impl CurrentSession {
    pub fn actor(&self) -> Option<Actor> {
        self.0.actor()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AppError::NotAuthenticated)
    }
}

/// Para rotas públicas que mudam de comportamento com sessão (ex: `/api/me`).
/// Sem cabeçalho: `None`. Token presente mas inválido: 401.
pub struct OptionalSession(pub Option<Session>);

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(OptionalSession(None));
        };
        let session = state
            .auth_service
            .authenticate(&token)
            .await
            .map_err(|e| reject(state, &parts.headers, e))?;
        Ok(OptionalSession(Some(session)))
    }
}
