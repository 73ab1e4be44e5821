// src/models/admin.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::validation::validate_not_blank, models::auth::AccountStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Admin {
    pub id: Uuid,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewAdminPayload {
    #[validate(custom(function = "validate_not_blank", message = "El nombre es obligatorio."))]
    pub first_name: String,
    #[validate(custom(function = "validate_not_blank", message = "El apellido paterno es obligatorio."))]
    pub paternal_surname: String,
    #[validate(custom(function = "validate_not_blank", message = "El apellido materno es obligatorio."))]
    pub maternal_surname: String,
    #[validate(email(message = "Email inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAdminPayload {
    pub first_name: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    /// Só é aceito se for igual ao atual.
    pub email: Option<String>,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: Option<String>,
    pub status: Option<AccountStatus>,
}
