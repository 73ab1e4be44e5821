// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de domínio. O texto do `#[error]` é só para logs;
// a mensagem que vai para o cliente vem do catálogo de idiomas.
#[derive(Debug, Error)]
pub enum AppError {
    // --- 400 ---
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campos obrigatórios ausentes: {0}")]
    MissingFields(String),

    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(String),

    #[error("Horário inválido")]
    InvalidSchedule,

    #[error("Loja física sem endereço ou horário")]
    PhysicalStoreRequiresAddress,

    #[error("Loja virtual com horário de atendimento")]
    VirtualStoreWithOpeningHours,

    #[error("Senha obrigatória")]
    PasswordRequired,

    #[error("Tipo de arquivo não permitido")]
    InvalidFileType,

    #[error("Plano inválido ou inativo")]
    InvalidPlan,

    #[error("Papel inválido")]
    InvalidRole,

    #[error("Papel não disponível para esta conta")]
    RoleNotAvailable,

    #[error("Senhas não conferem")]
    PasswordMismatch,

    #[error("Senha curta demais")]
    PasswordTooShort,

    #[error("Token de recuperação inválido ou expirado")]
    InvalidResetToken,

    #[error("Característica de plano com mais de 200 caracteres")]
    FeatureTooLong,

    #[error("Plano com mais de 12 características")]
    TooManyFeatures,

    #[error("Preço inválido")]
    InvalidPrice,

    #[error("O e-mail não pode ser alterado")]
    EmailImmutable,

    #[error("O tipo de cliente não pode ser alterado")]
    CustomerKindImmutable,

    #[error("Razão social obrigatória para empresas")]
    CompanyNameRequired,

    #[error("Microempresa inexistente ou inativa")]
    InvalidTenant,

    // --- 401 ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Token de onboarding inválido ou expirado")]
    InvalidOnboardingToken,

    #[error("Não autenticado")]
    NotAuthenticated,

    // --- 403 ---
    #[error("Acesso negado")]
    Forbidden,

    #[error("Administrador não pode se desativar")]
    CannotDeactivateSelf,

    #[error("Cadastro de super usuário fechado")]
    AdminSignupClosed,

    // --- 404 ---
    #[error("Conta não encontrada")]
    AccountNotFound,

    #[error("Microempresa não encontrada")]
    TenantNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Administrador não encontrado")]
    AdminNotFound,

    #[error("Plano não encontrado")]
    PlanNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Solicitação de onboarding não encontrada")]
    OnboardingNotFound,

    #[error("Comprovante não encontrado")]
    ProofNotFound,

    #[error("QR ainda não gerado")]
    QrNotAvailable,

    // --- 409 ---
    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Nome de negócio já existe")]
    BusinessNameAlreadyExists,

    #[error("Nome de plano já existe")]
    PlanNameAlreadyExists,

    #[error("Onboarding bloqueado para edição")]
    OnboardingLocked,

    #[error("Microempresa não está pendente")]
    TenantNotPending,

    #[error("Transição de estado inválida")]
    InvalidTransition,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // --- 500 ---
    #[error("Falha no envio de e-mail: {0}")]
    MailDelivery(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),
}

// Resposta de erro já traduzida, pronta para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP e chave do catálogo para cada variante.
    pub fn status_and_key(&self) -> (StatusCode, &'static str) {
        use AppError::*;
        match self {
            ValidationError(_) => (StatusCode::BAD_REQUEST, "errors.validation"),
            MissingFields(_) => (StatusCode::BAD_REQUEST, "errors.missing_fields"),
            InvalidBody(_) => (StatusCode::BAD_REQUEST, "errors.validation"),
            InvalidSchedule => (StatusCode::BAD_REQUEST, "errors.invalid_schedule"),
            PhysicalStoreRequiresAddress => (StatusCode::BAD_REQUEST, "errors.physical_store_requires_address"),
            VirtualStoreWithOpeningHours => (StatusCode::BAD_REQUEST, "errors.virtual_store_with_hours"),
            PasswordRequired => (StatusCode::BAD_REQUEST, "errors.password_required"),
            InvalidFileType => (StatusCode::BAD_REQUEST, "errors.invalid_file_type"),
            InvalidPlan => (StatusCode::BAD_REQUEST, "errors.invalid_plan"),
            InvalidRole => (StatusCode::BAD_REQUEST, "errors.invalid_role"),
            RoleNotAvailable => (StatusCode::BAD_REQUEST, "errors.role_not_available"),
            PasswordMismatch => (StatusCode::BAD_REQUEST, "errors.password_mismatch"),
            PasswordTooShort => (StatusCode::BAD_REQUEST, "errors.password_too_short"),
            InvalidResetToken => (StatusCode::BAD_REQUEST, "errors.invalid_reset_token"),
            FeatureTooLong => (StatusCode::BAD_REQUEST, "errors.feature_too_long"),
            TooManyFeatures => (StatusCode::BAD_REQUEST, "errors.too_many_features"),
            InvalidPrice => (StatusCode::BAD_REQUEST, "errors.invalid_price"),
            EmailImmutable => (StatusCode::BAD_REQUEST, "errors.email_immutable"),
            CustomerKindImmutable => (StatusCode::BAD_REQUEST, "errors.customer_kind_immutable"),
            CompanyNameRequired => (StatusCode::BAD_REQUEST, "errors.company_name_required"),
            InvalidTenant => (StatusCode::BAD_REQUEST, "errors.invalid_tenant"),

            InvalidCredentials => (StatusCode::UNAUTHORIZED, "errors.invalid_credentials"),
            InvalidToken => (StatusCode::UNAUTHORIZED, "errors.invalid_token"),
            InvalidOnboardingToken => (StatusCode::UNAUTHORIZED, "errors.invalid_onboarding_token"),
            NotAuthenticated => (StatusCode::UNAUTHORIZED, "errors.not_authenticated"),

            Forbidden => (StatusCode::FORBIDDEN, "errors.forbidden"),
            CannotDeactivateSelf => (StatusCode::FORBIDDEN, "errors.cannot_deactivate_self"),
            AdminSignupClosed => (StatusCode::FORBIDDEN, "errors.admin_signup_closed"),

            AccountNotFound => (StatusCode::NOT_FOUND, "errors.account_not_found"),
            TenantNotFound => (StatusCode::NOT_FOUND, "errors.tenant_not_found"),
            CustomerNotFound => (StatusCode::NOT_FOUND, "errors.customer_not_found"),
            AdminNotFound => (StatusCode::NOT_FOUND, "errors.admin_not_found"),
            PlanNotFound => (StatusCode::NOT_FOUND, "errors.plan_not_found"),
            ProductNotFound => (StatusCode::NOT_FOUND, "errors.product_not_found"),
            OnboardingNotFound => (StatusCode::NOT_FOUND, "errors.onboarding_not_found"),
            ProofNotFound => (StatusCode::NOT_FOUND, "errors.proof_not_found"),
            QrNotAvailable => (StatusCode::NOT_FOUND, "errors.qr_not_available"),

            EmailAlreadyExists => (StatusCode::CONFLICT, "errors.email_already_exists"),
            BusinessNameAlreadyExists => (StatusCode::CONFLICT, "errors.business_name_already_exists"),
            PlanNameAlreadyExists => (StatusCode::CONFLICT, "errors.plan_name_already_exists"),
            OnboardingLocked => (StatusCode::CONFLICT, "errors.onboarding_locked"),
            TenantNotPending => (StatusCode::CONFLICT, "errors.tenant_not_pending"),
            InvalidTransition => (StatusCode::CONFLICT, "errors.invalid_transition"),
            UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "errors.unique_violation"),

            MailDelivery(_) => (StatusCode::INTERNAL_SERVER_ERROR, "errors.mail_delivery"),
            DatabaseError(_) | InternalServerError(_) | BcryptError(_) | JwtError(_) | IoError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "errors.internal")
            }
        }
    }

    /// Converte o erro de domínio na resposta traduzida para o idioma do pedido.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();
        let lang = locale.0.as_str();

        if status.is_server_error() {
            tracing::error!(error = %self, "Erro interno do servidor");
        }

        let (error, details) = match &self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => store.translate(lang, &format!("validation.{}", e.code)),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (store.translate(lang, key), Some(json!(details)))
            }
            AppError::InvalidBody(reason) => (store.translate(lang, key), Some(json!({ "body": [reason] }))),
            AppError::MissingFields(fields) => (
                store.translate_with(lang, key, &[("fields", fields.as_str())]),
                None,
            ),
            _ => (store.translate(lang, key), None),
        };

        ApiError { status, error, details }
    }
}

// Usado fora dos handlers (extratores sem idioma): responde no idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::shared())
            .into_response()
    }
}

/// Mapeia violações de unicidade do Postgres para conflitos de domínio.
pub fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "admins_email_key" | "tenants_email_key" | "customers_tenant_email_key" => {
                        AppError::EmailAlreadyExists
                    }
                    "plans_name_key" => AppError::PlanNameAlreadyExists,
                    "subscriptions_onboarding_request_key" => AppError::InvalidTransition,
                    _ => AppError::UniqueConstraintViolation(constraint.to_string()),
                };
            }
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(AppError::OnboardingLocked.status_and_key().0, StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidTransition.status_and_key().0, StatusCode::CONFLICT);
        assert_eq!(AppError::EmailAlreadyExists.status_and_key().0, StatusCode::CONFLICT);
    }

    #[test]
    fn mail_failure_is_a_server_error() {
        let (status, _) = AppError::MailDelivery("smtp down".into()).status_and_key();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_fields_message_lists_the_fields() {
        let api = AppError::MissingFields("email, token".into())
            .to_api_error(&Locale("en".into()), I18nStore::shared());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.error.contains("email, token"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("email", validator::ValidationError::new("email"));
        let api = AppError::ValidationError(errors)
            .to_api_error(&Locale::default(), I18nStore::shared());
        let details = api.details.expect("details");
        assert!(details.get("email").is_some());
    }
}
