// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{CurrentSession, OptionalSession},
        i18n::Locale,
    },
    models::auth::{
        AuthResponse, GuestResponse, LoginPayload, MeResponse, MessageResponse, RegisterPayload, Role,
        SelectRoleResponse, SwitchRolePayload,
    },
    services::auth::{IssuedSession, LoginOutcome},
};

impl From<IssuedSession> for AuthResponse {
    fn from(issued: IssuedSession) -> Self {
        AuthResponse {
            token: issued.token,
            role: issued.principal.role(),
            user: issued.principal,
            available_roles: issued.available_roles,
        }
    }
}

// Os campos do perfil dependem do papel; o resto do corpo vira o payload tipado
fn profile_as<T: DeserializeOwned>(profile: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(profile)).map_err(|e| AppError::InvalidBody(e.to_string()))
}

// POST /api/register
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Auth",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Conta criada e sessão iniciada", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Cadastro de super usuário fechado"),
        (status = 409, description = "E-mail ou nome de negócio já existe")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    let auth_service = &app_state.auth_service;

    let role = auth_service
        .parse_role(payload.role.as_deref())
        .and_then(|role| role.ok_or_else(|| AppError::MissingFields("role".into())))
        .map_err(to_api)?;

    let issued = match role {
        Role::SuperAdmin => {
            let profile = profile_as(payload.profile).map_err(to_api)?;
            auth_service.register_admin(profile).await
        }
        Role::Tenant => {
            let profile = profile_as(payload.profile).map_err(to_api)?;
            auth_service.register_tenant(profile).await
        }
        Role::Customer => {
            let profile = profile_as(payload.profile).map_err(to_api)?;
            auth_service.register_customer(profile).await
        }
    }
    .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(issued))))
}

// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Sessão iniciada, ou `select_role` quando mais de um papel bate", body = AuthResponse),
        (status = 400, description = "Campos ausentes ou papel inválido"),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let identifier = payload
        .username
        .as_deref()
        .or(payload.email.as_deref())
        .map(str::trim)
        .filter(|i| !i.is_empty());
    let password = payload.password.as_deref().filter(|p| !p.is_empty());
    let (Some(identifier), Some(password)) = (identifier, password) else {
        return Err(to_api(AppError::MissingFields("username, password".into())));
    };

    let role = app_state.auth_service.parse_role(payload.role.as_deref()).map_err(to_api)?;

    let outcome = app_state
        .auth_service
        .login(identifier, password, role, payload.tenant_id)
        .await
        .map_err(to_api)?;

    let response = match outcome {
        LoginOutcome::Authenticated(issued) => (StatusCode::OK, Json(AuthResponse::from(issued))).into_response(),
        LoginOutcome::SelectRole { roles, tenants } => {
            let body = SelectRoleResponse {
                select_role: true,
                roles,
                message: app_state.i18n_store.translate(&locale.0, "auth.select_role"),
                tenants,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
    };
    Ok(response)
}

// POST /api/guest-login
#[utoipa::path(
    post,
    path = "/api/guest-login",
    tag = "Auth",
    responses((status = 200, description = "Token de visitante", body = GuestResponse))
)]
pub async fn guest_login(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let token = app_state
        .auth_service
        .guest_token()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(GuestResponse { token, guest: true })))
}

// POST /api/logout
// Sessão sem estado no servidor: basta o cliente descartar o token.
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    responses((status = 200, description = "Sessão encerrada", body = MessageResponse))
)]
pub async fn logout(State(app_state): State<AppState>, locale: Locale) -> impl IntoResponse {
    let message = app_state.i18n_store.translate(&locale.0, "auth.logged_out");
    (StatusCode::OK, Json(MessageResponse { message }))
}

// GET /api/me
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Principal da sessão, ou visitante", body = MeResponse),
        (status = 401, description = "Token inválido ou conta inativa")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn me(State(app_state): State<AppState>, OptionalSession(session): OptionalSession) -> impl IntoResponse {
    let response = match session {
        Some(session) if !session.is_guest() => MeResponse {
            available_roles: app_state.auth_service.available_roles(&session),
            role: session.principal.as_ref().map(|p| p.role()),
            user: session.principal,
            guest: false,
        },
        _ => MeResponse { user: None, role: None, available_roles: Vec::new(), guest: true },
    };
    (StatusCode::OK, Json(response))
}

// POST /api/switch-role
#[utoipa::path(
    post,
    path = "/api/switch-role",
    tag = "Auth",
    request_body = SwitchRolePayload,
    responses(
        (status = 200, description = "Nova sessão no papel escolhido", body = AuthResponse),
        (status = 400, description = "Papel inválido ou não provado no login"),
        (status = 401, description = "Sessão inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn switch_role(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<SwitchRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let role = app_state
        .auth_service
        .parse_role(payload.role.as_deref())
        .and_then(|role| role.ok_or_else(|| AppError::MissingFields("role".into())))
        .map_err(to_api)?;

    let issued = app_state
        .auth_service
        .switch_role(&session, role, payload.tenant_id)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(AuthResponse::from(issued))))
}
