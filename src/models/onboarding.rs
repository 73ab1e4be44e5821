// src/models/onboarding.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_logo_url;

/// Prefixo do texto de referência codificado no QR de pagamento.
pub const QR_PREFIX: &str = "MICROEMPRESA_SAAS";

// Mapeia o CREATE TYPE onboarding_state do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "onboarding_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OnboardingState {
    Draft,
    PlanSelected,
    AwaitingReview,
    Approved,
    Rejected,
}

impl OnboardingState {
    /// Estados em que os dados do cadastro ainda podem ser editados pelo dono.
    pub const EDITABLE: [OnboardingState; 2] = [OnboardingState::Draft, OnboardingState::PlanSelected];

    /// Depois do envio, o cadastro fica travado para sempre.
    pub fn is_locked(&self) -> bool {
        !Self::EDITABLE.contains(self)
    }

    pub fn can_submit(&self) -> bool {
        !self.is_locked()
    }

    pub fn can_review(&self) -> bool {
        *self == OnboardingState::AwaitingReview
    }

    /// Chave do catálogo com a mensagem fixa de cada estado.
    pub fn message_key(&self) -> &'static str {
        match self {
            OnboardingState::Draft => "onboarding.status.draft",
            OnboardingState::PlanSelected => "onboarding.status.plan_selected",
            OnboardingState::AwaitingReview => "onboarding.status.awaiting_review",
            OnboardingState::Approved => "onboarding.status.approved",
            OnboardingState::Rejected => "onboarding.status.rejected",
        }
    }
}

/// Decisão do super usuário sobre uma solicitação em revisão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn target_state(&self) -> OnboardingState {
        match self {
            ReviewDecision::Approve => OnboardingState::Approved,
            ReviewDecision::Reject => OnboardingState::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OnboardingRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub state: OnboardingState,

    #[serde(skip_serializing)]
    pub token_hash: String,
    pub token_expires_at: DateTime<Utc>,

    pub qr_text: Option<String>,
    #[serde(skip_serializing)]
    pub proof_path: Option<String>,
    pub review_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OnboardingRequest {
    pub fn has_proof(&self) -> bool {
        self.proof_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Texto de referência do pagamento. Gerado uma única vez por solicitação.
pub fn reference_text(signup_id: Uuid, tenant_id: Uuid, plan_id: Uuid) -> String {
    format!("{QR_PREFIX}|SIGNUP:{signup_id}|TENANT:{tenant_id}|PLAN:{plan_id}")
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartOnboardingPayload {
    /// Presente para editar um cadastro existente (exige `onboarding_token`).
    pub signup_id: Option<Uuid>,
    pub onboarding_token: Option<String>,

    pub business_name: Option<String>,
    pub owner_first_name: Option<String>,
    pub owner_paternal_surname: Option<String>,
    pub owner_maternal_surname: Option<String>,
    pub address: Option<String>,
    pub schedule: Option<String>,
    pub email: Option<String>,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: Option<String>,
    #[validate(custom(function = "validate_logo_url", message = "La URL del logo no es válida."))]
    pub logo_url: Option<String>,
    /// `fisica` | `virtual`
    pub store_kind: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartOnboardingResponse {
    pub message: String,
    pub tenant_id: Uuid,
    pub signup_id: Uuid,
    /// Só aparece quando um token novo é emitido.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OnboardingStatusResponse {
    pub signup_id: Uuid,
    pub tenant_id: Uuid,
    pub id_plan: Option<Uuid>,
    pub state: OnboardingState,
    pub message: String,
    pub has_proof: bool,
    pub qr_text: Option<String>,
}

/// Escolha do plano antes do envio do comprovante (draft -> plan_selected).
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectPlanPayload {
    pub signup_id: Option<Uuid>,
    #[serde(alias = "plan_id")]
    pub id_plan: Option<Uuid>,
    pub onboarding_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitOnboardingResponse {
    pub message: String,
    pub signup_id: Uuid,
    pub state: OnboardingState,
    pub qr_text: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct SignupQuery {
    pub signup_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReviewPayload {
    pub note: Option<String>,
}

/// Linha da fila de revisão do super usuário.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PendingReview {
    pub signup_id: Uuid,
    pub tenant_id: Uuid,
    pub business_name: String,
    pub email: String,
    pub owner_first_name: String,
    pub owner_paternal_surname: String,
    pub plan_id: Option<Uuid>,
    pub plan_name: Option<String>,
    pub plan_price: Option<Decimal>,
    pub qr_text: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub proof_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_draft_and_plan_selected_are_editable() {
        assert!(!OnboardingState::Draft.is_locked());
        assert!(!OnboardingState::PlanSelected.is_locked());
        assert!(OnboardingState::AwaitingReview.is_locked());
        assert!(OnboardingState::Approved.is_locked());
        assert!(OnboardingState::Rejected.is_locked());
    }

    #[test]
    fn only_awaiting_review_can_be_reviewed() {
        for state in [
            OnboardingState::Draft,
            OnboardingState::PlanSelected,
            OnboardingState::Approved,
            OnboardingState::Rejected,
        ] {
            assert!(!state.can_review(), "{state:?}");
        }
        assert!(OnboardingState::AwaitingReview.can_review());
    }

    #[test]
    fn reference_text_has_fixed_layout() {
        let (s, t, p) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            reference_text(s, t, p),
            format!("MICROEMPRESA_SAAS|SIGNUP:{s}|TENANT:{t}|PLAN:{p}")
        );
    }

    #[test]
    fn decisions_map_to_terminal_states() {
        assert_eq!(ReviewDecision::Approve.target_state(), OnboardingState::Approved);
        assert_eq!(ReviewDecision::Reject.target_state(), OnboardingState::Rejected);
    }
}
