// src/models/subscription.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Mapeia o CREATE TYPE subscription_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

/// Criada apenas pela aprovação de uma solicitação de onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subscription {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan_id: Uuid,
    pub onboarding_request_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

/// Resultado da aprovação: a microempresa ativada e a assinatura criada.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovalOutcome {
    pub message: String,
    pub signup_id: Uuid,
    pub tenant_id: Uuid,
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RejectionOutcome {
    pub message: String,
    pub signup_id: Uuid,
    pub tenant_id: Uuid,
}
