// src/models/password_reset.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::auth::Role;

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetRequestPayload {
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetConfirmPayload {
    pub email: Option<String>,
    pub role: Option<String>,
    pub token: Option<String>,
    #[serde(alias = "password")]
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetRequestedResponse {
    pub message: String,
    pub role: Role,
}
