// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, validation::{non_blank, validate_not_blank}},
    models::auth::AccountStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub first_name: String,
    pub last_names: String,
    /// Razão social, obrigatória quando `is_company`.
    pub business_name: Option<String>,
    pub is_company: bool,
    pub is_generic: bool,
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewCustomerPayload {
    /// Obrigatório para o admin e no auto-cadastro; ignorado quando quem cria é a microempresa.
    pub tenant_id: Option<Uuid>,
    #[validate(custom(function = "validate_not_blank", message = "El nombre es obligatorio."))]
    pub first_name: String,
    #[serde(default)]
    pub last_names: String,
    pub business_name: Option<String>,
    #[serde(default)]
    pub is_company: bool,
    #[serde(default)]
    pub is_generic: bool,
    #[validate(email(message = "Email inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: String,
}

impl NewCustomerPayload {
    /// Empresas precisam de razão social.
    pub fn validate_consistency(&self) -> Result<(), AppError> {
        if self.is_company && non_blank(self.business_name.as_deref()).is_none() {
            return Err(AppError::CompanyNameRequired);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerPayload {
    pub first_name: Option<String>,
    pub last_names: Option<String>,
    pub business_name: Option<String>,
    /// Só é aceito se for igual ao atual.
    pub is_company: Option<bool>,
    pub is_generic: Option<bool>,
    /// Só é aceito se for igual ao atual.
    pub email: Option<String>,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct CustomerFilter {
    pub tenant_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(is_company: bool, business_name: Option<&str>) -> NewCustomerPayload {
        NewCustomerPayload {
            tenant_id: None,
            first_name: "Ana".into(),
            last_names: "Quispe".into(),
            business_name: business_name.map(str::to_string),
            is_company,
            is_generic: false,
            email: "ana@example.com".into(),
            password: "secreto".into(),
        }
    }

    #[test]
    fn company_customer_requires_business_name() {
        assert!(matches!(
            payload(true, Some("  ")).validate_consistency(),
            Err(AppError::CompanyNameRequired)
        ));
        assert!(payload(true, Some("Ana SAC")).validate_consistency().is_ok());
        assert!(payload(false, None).validate_consistency().is_ok());
    }
}
