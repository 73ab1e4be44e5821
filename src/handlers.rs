// src/handlers.rs

pub mod admins;
pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod onboarding;
pub mod password_reset;
pub mod plans;
pub mod products;
pub mod tenants;

use uuid::Uuid;

use crate::{
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{AccountStatus, StatusChangeResponse},
};

/// Corpo comum das rotas de ativar/desativar/excluir.
pub(crate) fn status_change(app_state: &AppState, locale: &Locale, id: Uuid, status: AccountStatus) -> StatusChangeResponse {
    let key = match status {
        AccountStatus::Active => "records.activated",
        AccountStatus::Inactive | AccountStatus::Pending => "records.deactivated",
    };
    StatusChangeResponse {
        message: app_state.i18n_store.translate(&locale.0, key),
        id,
        status,
    }
}
