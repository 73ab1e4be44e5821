// src/handlers/onboarding.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::{
        onboarding::{
            OnboardingRequest, OnboardingStatusResponse, PendingReview, ReviewDecision, ReviewPayload,
            SelectPlanPayload, SignupQuery, StartOnboardingPayload, StartOnboardingResponse,
            SubmitOnboardingResponse,
        },
        subscription::{ApprovalOutcome, RejectionOutcome},
    },
    services::{
        authorization::require_super_admin,
        onboarding_service::{ReviewOutcome, StartMode},
    },
};

fn status_response(request: OnboardingRequest, locale: &Locale, store: &I18nStore) -> OnboardingStatusResponse {
    OnboardingStatusResponse {
        signup_id: request.id,
        tenant_id: request.tenant_id,
        id_plan: request.plan_id,
        state: request.state,
        message: store.translate(&locale.0, request.state.message_key()),
        has_proof: request.has_proof(),
        qr_text: request.qr_text,
    }
}

fn parse_uuid_field(name: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidBody(format!("{name}: UUID inválido")))
}

// =============================================================================
//  ÁREA 1: CADASTRO PÚBLICO
// =============================================================================

// POST /api/onboarding/microempresa/start
#[utoipa::path(
    post,
    path = "/api/onboarding/microempresa/start",
    tag = "Onboarding",
    request_body = StartOnboardingPayload,
    responses(
        (status = 201, description = "Cadastro criado; devolve o token de edição", body = StartOnboardingResponse),
        (status = 200, description = "Cadastro retomado (novo token) ou editado", body = StartOnboardingResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Senha ou token de edição inválidos"),
        (status = 409, description = "E-mail/nome em uso ou cadastro já enviado")
    )
)]
pub async fn start(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<StartOnboardingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;

    let outcome = app_state.onboarding_service.start(&payload).await.map_err(to_api)?;

    let (status, key) = match outcome.mode {
        StartMode::Created => (StatusCode::CREATED, "onboarding.started"),
        StartMode::Resumed => (StatusCode::OK, "onboarding.started"),
        StartMode::Edited => (StatusCode::OK, "onboarding.updated"),
    };
    let response = StartOnboardingResponse {
        message: app_state.i18n_store.translate(&locale.0, key),
        tenant_id: outcome.tenant_id,
        signup_id: outcome.signup_id,
        onboarding_expires_at: outcome.token.as_ref().map(|t| t.expires_at),
        onboarding_token: outcome.token.map(|t| t.token),
    };
    Ok((status, Json(response)))
}

// POST /api/onboarding/microempresa/select-plan
#[utoipa::path(
    post,
    path = "/api/onboarding/microempresa/select-plan",
    tag = "Onboarding",
    request_body = SelectPlanPayload,
    responses(
        (status = 200, description = "Plano escolhido", body = OnboardingStatusResponse),
        (status = 400, description = "Plano inválido ou inativo"),
        (status = 401, description = "Token de edição inválido"),
        (status = 404, description = "Cadastro não encontrado"),
        (status = 409, description = "Cadastro já enviado")
    )
)]
pub async fn select_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SelectPlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let (Some(signup_id), Some(plan_id)) = (payload.signup_id, payload.id_plan) else {
        return Err(to_api(AppError::MissingFields("signup_id, id_plan".into())));
    };

    let request = app_state
        .onboarding_service
        .select_plan(signup_id, plan_id, payload.onboarding_token.as_deref())
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(status_response(request, &locale, &app_state.i18n_store))))
}

// POST /api/onboarding/microempresa/submit (multipart)
#[utoipa::path(
    post,
    path = "/api/onboarding/microempresa/submit",
    tag = "Onboarding",
    request_body(
        content_type = "multipart/form-data",
        description = "Campos `signup_id`, `id_plan` (ou `plan_id`), `onboarding_token` e o arquivo em `file` (ou `comprobante`)"
    ),
    responses(
        (status = 200, description = "Comprovante enviado; aguardando revisão", body = SubmitOnboardingResponse),
        (status = 400, description = "Campos ausentes, plano inválido ou tipo de arquivo não permitido"),
        (status = 401, description = "Token de edição inválido"),
        (status = 404, description = "Cadastro não encontrado"),
        (status = 409, description = "Cadastro já enviado")
    )
)]
pub async fn submit(
    State(app_state): State<AppState>,
    locale: Locale,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    let body_error = |e: axum::extract::multipart::MultipartError| to_api(AppError::InvalidBody(e.body_text()));

    let mut signup_id = None;
    let mut plan_id = None;
    let mut token = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(body_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "signup_id" => signup_id = Some(field.text().await.map_err(body_error)?),
            "id_plan" | "plan_id" => plan_id = Some(field.text().await.map_err(body_error)?),
            "onboarding_token" => token = Some(field.text().await.map_err(body_error)?),
            "file" | "comprobante" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(body_error)?;
                if !filename.is_empty() {
                    file = Some((filename, bytes));
                }
            }
            _ => {}
        }
    }

    let signup_id = signup_id.filter(|v| !v.trim().is_empty());
    let plan_id = plan_id.filter(|v| !v.trim().is_empty());
    let missing: Vec<&str> = [
        ("signup_id", signup_id.is_some()),
        ("id_plan", plan_id.is_some()),
        ("file", file.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| (!present).then_some(name))
    .collect();
    let (Some(signup_id), Some(plan_id), Some((filename, bytes))) = (signup_id, plan_id, file) else {
        return Err(to_api(AppError::MissingFields(missing.join(", "))));
    };

    let signup_id = parse_uuid_field("signup_id", &signup_id).map_err(to_api)?;
    let plan_id = parse_uuid_field("id_plan", &plan_id).map_err(to_api)?;

    let request = app_state
        .onboarding_service
        .submit(signup_id, plan_id, token.as_deref(), &filename, &bytes)
        .await
        .map_err(to_api)?;

    let response = SubmitOnboardingResponse {
        message: app_state.i18n_store.translate(&locale.0, "onboarding.submitted"),
        signup_id: request.id,
        state: request.state,
        qr_text: request.qr_text,
    };
    Ok((StatusCode::OK, Json(response)))
}

// GET /api/onboarding/microempresa/status?signup_id=
#[utoipa::path(
    get,
    path = "/api/onboarding/microempresa/status",
    tag = "Onboarding",
    params(SignupQuery),
    responses(
        (status = 200, description = "Estado atual do cadastro", body = OnboardingStatusResponse),
        (status = 404, description = "Cadastro não encontrado")
    )
)]
pub async fn status(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<SignupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let signup_id = query
        .signup_id
        .ok_or_else(|| to_api(AppError::MissingFields("signup_id".into())))?;
    let request = app_state.onboarding_service.status(signup_id).await.map_err(to_api)?;

    Ok((StatusCode::OK, Json(status_response(request, &locale, &app_state.i18n_store))))
}

// GET /api/onboarding/microempresa/qr?signup_id=
#[utoipa::path(
    get,
    path = "/api/onboarding/microempresa/qr",
    tag = "Onboarding",
    params(SignupQuery),
    responses(
        (status = 200, description = "QR do texto de referência", content_type = "image/svg+xml", body = String),
        (status = 404, description = "Cadastro não encontrado ou QR ainda não gerado")
    )
)]
pub async fn qr(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<SignupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let signup_id = query
        .signup_id
        .ok_or_else(|| to_api(AppError::MissingFields("signup_id".into())))?;
    let svg = app_state.onboarding_service.qr_svg(signup_id).await.map_err(to_api)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

// =============================================================================
//  ÁREA 2: REVISÃO (SUPER USUÁRIO)
// =============================================================================

// GET /api/onboarding/microempresa/pending
#[utoipa::path(
    get,
    path = "/api/onboarding/microempresa/pending",
    tag = "Onboarding",
    responses(
        (status = 200, description = "Fila de revisão, mais antigos primeiro", body = Vec<PendingReview>),
        (status = 401, description = "Não autenticado"),
        (status = 403, description = "Apenas super usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_super_admin(session.actor().as_ref()).map_err(to_api)?;
    let pending = app_state.onboarding_service.list_pending().await.map_err(to_api)?;

    Ok((StatusCode::OK, Json(pending)))
}

// GET /api/onboarding/microempresa/proof/{signup_id}
#[utoipa::path(
    get,
    path = "/api/onboarding/microempresa/proof/{signup_id}",
    tag = "Onboarding",
    params(("signup_id" = Uuid, Path, description = "ID do cadastro")),
    responses(
        (status = 200, description = "Arquivo do comprovante", content_type = "application/octet-stream"),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Comprovante não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_proof(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(signup_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_super_admin(session.actor().as_ref()).map_err(to_api)?;
    let proof = app_state.onboarding_service.proof(signup_id).await.map_err(to_api)?;

    let headers = [
        (header::CONTENT_TYPE, proof.content_type.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", proof.filename)),
    ];
    Ok((headers, proof.bytes))
}

async fn review(
    app_state: &AppState,
    locale: &Locale,
    session: &CurrentSession,
    tenant_id: Uuid,
    decision: ReviewDecision,
    payload: Option<ReviewPayload>,
) -> Result<axum::response::Response, AppError> {
    let reviewer_id = require_super_admin(session.actor().as_ref())?;
    let note = payload.and_then(|p| p.note);

    let outcome = app_state
        .onboarding_service
        .review(tenant_id, decision, reviewer_id, note.as_deref())
        .await?;

    let store = &app_state.i18n_store;
    let response = match outcome {
        ReviewOutcome::Approved { request, subscription } => Json(ApprovalOutcome {
            message: store.translate(&locale.0, "onboarding.approved"),
            signup_id: request.id,
            tenant_id: request.tenant_id,
            subscription,
        })
        .into_response(),
        ReviewOutcome::Rejected { request } => Json(RejectionOutcome {
            message: store.translate(&locale.0, "onboarding.rejected"),
            signup_id: request.id,
            tenant_id: request.tenant_id,
        })
        .into_response(),
    };
    Ok(response)
}

// PATCH /api/onboarding/microempresa/{tenant_id}/approve
#[utoipa::path(
    patch,
    path = "/api/onboarding/microempresa/{tenant_id}/approve",
    tag = "Onboarding",
    params(("tenant_id" = Uuid, Path, description = "ID da microempresa")),
    request_body(content = ReviewPayload, description = "Observação opcional"),
    responses(
        (status = 200, description = "Microempresa ativada e assinatura criada", body = ApprovalOutcome),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Microempresa ou cadastro não encontrado"),
        (status = 409, description = "Cadastro não está aguardando revisão")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(tenant_id): Path<Uuid>,
    payload: Option<Json<ReviewPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    review(&app_state, &locale, &session, tenant_id, ReviewDecision::Approve, payload.map(|Json(p)| p))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}

// PATCH /api/onboarding/microempresa/{tenant_id}/reject
#[utoipa::path(
    patch,
    path = "/api/onboarding/microempresa/{tenant_id}/reject",
    tag = "Onboarding",
    params(("tenant_id" = Uuid, Path, description = "ID da microempresa")),
    request_body(content = ReviewPayload, description = "Motivo opcional"),
    responses(
        (status = 200, description = "Microempresa rejeitada e inativada", body = RejectionOutcome),
        (status = 403, description = "Apenas super usuário"),
        (status = 404, description = "Microempresa ou cadastro não encontrado"),
        (status = 409, description = "Cadastro não está aguardando revisão")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(tenant_id): Path<Uuid>,
    payload: Option<Json<ReviewPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    review(&app_state, &locale, &session, tenant_id, ReviewDecision::Reject, payload.map(|Json(p)| p))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}
