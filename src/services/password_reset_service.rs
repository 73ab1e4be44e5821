// src/services/password_reset_service.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, i18n::I18nStore, validation::normalize_email},
    db::{AdminRepository, CustomerRepository, PasswordResetRepository, TenantRepository},
    models::auth::Role,
    services::{
        identity::RoleRegistry,
        mail_service::{MailMessage, Mailer},
        security::{generate_token, hash_password, TokenHasher},
    },
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    /// Token gerado e enviado para o papel indicado.
    Sent(Role),
    /// O e-mail existe em mais de um papel; o cliente precisa escolher.
    SelectRole(Vec<Role>),
}

/// Dados do formulário de nova senha, ainda crus.
#[derive(Debug, Default)]
pub struct ResetConfirmation<'a> {
    pub email: Option<&'a str>,
    pub role: Option<&'a str>,
    pub token: Option<&'a str>,
    pub new_password: Option<&'a str>,
    pub confirm_password: Option<&'a str>,
}

/// Validação sem banco: campos, confirmação e tamanho mínimo.
pub fn check_new_password(new_password: &str, confirm_password: Option<&str>) -> Result<(), AppError> {
    if confirm_password.is_some_and(|confirm| confirm != new_password) {
        return Err(AppError::PasswordMismatch);
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::PasswordTooShort);
    }
    Ok(())
}

#[derive(Clone)]
pub struct PasswordResetService {
    repo: PasswordResetRepository,
    admin_repo: AdminRepository,
    tenant_repo: TenantRepository,
    customer_repo: CustomerRepository,
    registry: RoleRegistry,
    hasher: TokenHasher,
    mailer: Arc<dyn Mailer>,
    i18n_store: Arc<I18nStore>,
    mail_from: String,
    ttl_minutes: i64,
    pool: PgPool,
}

impl PasswordResetService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: PasswordResetRepository,
        admin_repo: AdminRepository,
        tenant_repo: TenantRepository,
        customer_repo: CustomerRepository,
        registry: RoleRegistry,
        hasher: TokenHasher,
        mailer: Arc<dyn Mailer>,
        i18n_store: Arc<I18nStore>,
        mail_from: String,
        ttl_minutes: i64,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            admin_repo,
            tenant_repo,
            customer_repo,
            registry,
            hasher,
            mailer,
            i18n_store,
            mail_from,
            ttl_minutes,
            pool,
        }
    }

    /// Papéis habilitados que têm conta com esse e-mail.
    async fn roles_for_email(&self, email: &str) -> Result<Vec<Role>, AppError> {
        let mut roles = Vec::new();
        for role in self.registry.roles() {
            let exists = match role {
                Role::SuperAdmin => self.admin_repo.find_by_email(email).await?.is_some(),
                Role::Tenant => self.tenant_repo.find_by_email(&self.pool, email).await?.is_some(),
                Role::Customer => !self.customer_repo.find_by_email(&self.pool, email, None).await?.is_empty(),
            };
            if exists {
                roles.push(*role);
            }
        }
        Ok(roles)
    }

    fn parse_role(&self, raw: &str) -> Result<Role, AppError> {
        Role::parse(raw)
            .filter(|r| self.registry.contains(*r))
            .ok_or(AppError::InvalidRole)
    }

    /// Gera o token, grava (commit) e só depois envia o e-mail.
    /// Se o envio falhar o token continua válido e o erro vira 500.
    pub async fn request(&self, email: Option<&str>, role: Option<&str>, lang: &str) -> Result<ResetRequestOutcome, AppError> {
        let email = email
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::MissingFields("email".into()))?;
        let requested = role.map(str::trim).filter(|r| !r.is_empty());

        let roles = self.roles_for_email(&email).await?;
        if roles.is_empty() {
            return Err(AppError::AccountNotFound);
        }

        let role = match requested {
            None if roles.len() > 1 => return Ok(ResetRequestOutcome::SelectRole(roles)),
            None => roles[0],
            Some(raw) => {
                let role = Role::parse(raw).ok_or(AppError::InvalidRole)?;
                if !roles.contains(&role) {
                    return Err(AppError::RoleNotAvailable);
                }
                role
            }
        };

        let token = generate_token()?;
        let expires_at = Utc::now() + Duration::minutes(self.ttl_minutes);
        let mut tx = self.pool.begin().await?;
        self.repo
            .create(&mut *tx, &email, role, &self.hasher.hash(&token), expires_at)
            .await?;
        tx.commit().await?;

        tracing::info!(%role, "Token de recuperação de senha gerado");

        let minutes = self.ttl_minutes.to_string();
        let message = MailMessage {
            to: email.clone(),
            from: self.mail_from.clone(),
            subject: self.i18n_store.translate(lang, "password_reset.mail_subject"),
            body: self.i18n_store.translate_with(
                lang,
                "password_reset.mail_body",
                &[("token", token.as_str()), ("minutes", minutes.as_str())],
            ),
        };
        if let Err(e) = self.mailer.send(&message).await {
            tracing::error!(%role, "Falha ao enviar e-mail de recuperação: {:#}", e);
            return Err(AppError::MailDelivery(e.to_string()));
        }

        Ok(ResetRequestOutcome::Sent(role))
    }

    /// Troca a senha e consome o token na mesma transação.
    pub async fn confirm(&self, input: ResetConfirmation<'_>) -> Result<(), AppError> {
        let email = input.email.map(normalize_email).filter(|e| !e.is_empty());
        let role = input.role.map(str::trim).filter(|r| !r.is_empty());
        let token = input.token.map(str::trim).filter(|t| !t.is_empty());
        let new_password = input.new_password.filter(|p| !p.is_empty());

        let (Some(email), Some(role), Some(token), Some(new_password)) = (email, role, token, new_password) else {
            return Err(AppError::MissingFields("email, role, token, new_password".into()));
        };
        check_new_password(new_password, input.confirm_password)?;
        let role = self.parse_role(role)?;

        let exists = match role {
            Role::SuperAdmin => self.admin_repo.find_by_email(&email).await?.is_some(),
            Role::Tenant => self.tenant_repo.find_by_email(&self.pool, &email).await?.is_some(),
            Role::Customer => !self.customer_repo.find_by_email(&self.pool, &email, None).await?.is_empty(),
        };
        if !exists {
            return Err(AppError::AccountNotFound);
        }

        let password_hash = hash_password(new_password).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let record = self
            .repo
            .find_usable_for_update(&mut *tx, &email, role, &self.hasher.hash(token), now)
            .await?
            .filter(|r| self.hasher.verify(token, &r.token_hash, r.expires_at, now))
            .ok_or(AppError::InvalidResetToken)?;

        let updated = match role {
            Role::SuperAdmin => self.admin_repo.update_password_by_email(&mut *tx, &email, &password_hash).await?,
            Role::Tenant => self.tenant_repo.update_password_by_email(&mut *tx, &email, &password_hash).await?,
            Role::Customer => {
                self.customer_repo
                    .update_password_by_email(&mut *tx, &email, &password_hash)
                    .await?
            }
        };
        if updated == 0 {
            return Err(AppError::AccountNotFound);
        }
        if !self.repo.mark_used(&mut *tx, record.id).await? {
            return Err(AppError::InvalidResetToken);
        }

        tx.commit().await?;

        tracing::info!(%role, accounts = updated, "🔒 Senha redefinida por token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_must_match() {
        assert!(matches!(check_new_password("secreto", Some("secret0")), Err(AppError::PasswordMismatch)));
        assert!(check_new_password("secreto", Some("secreto")).is_ok());
        assert!(check_new_password("secreto", None).is_ok());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(matches!(check_new_password("12345", None), Err(AppError::PasswordTooShort)));
        assert!(check_new_password("123456", None).is_ok());
    }
}
