// src/services/admin_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        validation::{non_blank, normalize_email},
    },
    db::AdminRepository,
    models::{
        admin::{Admin, NewAdminPayload, UpdateAdminPayload},
        auth::AccountStatus,
    },
    services::{
        authorization::{require_super_admin, Actor},
        security::hash_password,
    },
};

#[derive(Clone)]
pub struct AdminService {
    repo: AdminRepository,
    pool: PgPool,
}

impl AdminService {
    pub fn new(repo: AdminRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    async fn insert(&self, payload: NewAdminPayload, only_if_first: bool) -> Result<Admin, AppError> {
        payload.validate()?;
        let email = normalize_email(&payload.email);
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        if only_if_first {
            // Serializa cadastros concorrentes do primeiro super usuário
            sqlx::query("LOCK TABLE admins IN SHARE ROW EXCLUSIVE MODE")
                .execute(&mut *tx)
                .await?;
            if self.repo.count(&mut *tx).await? > 0 {
                return Err(AppError::AdminSignupClosed);
            }
        }

        let admin = self
            .repo
            .create(
                &mut *tx,
                payload.first_name.trim(),
                payload.paternal_surname.trim(),
                payload.maternal_surname.trim(),
                &email,
                &password_hash,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(admin_id = %admin.id, "Super usuário criado");
        Ok(admin)
    }

    /// Auto-cadastro de super usuário: só enquanto não existe nenhum.
    pub async fn register_first(&self, payload: NewAdminPayload) -> Result<Admin, AppError> {
        self.insert(payload, true).await
    }

    pub async fn create(&self, actor: Option<&Actor>, payload: NewAdminPayload) -> Result<Admin, AppError> {
        require_super_admin(actor)?;
        self.insert(payload, false).await
    }

    /// Cria o super usuário inicial a partir da configuração, se ainda não houver nenhum.
    pub async fn ensure_bootstrap(&self, email: &str, password: &str) -> Result<Option<Admin>, AppError> {
        if self.repo.count(&self.pool).await? > 0 {
            return Ok(None);
        }
        let payload = NewAdminPayload {
            first_name: "Super".into(),
            paternal_surname: "Usuario".into(),
            maternal_surname: "Sistema".into(),
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.insert(payload, true).await {
            Ok(admin) => Ok(Some(admin)),
            Err(AppError::AdminSignupClosed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list(&self, actor: Option<&Actor>) -> Result<Vec<Admin>, AppError> {
        require_super_admin(actor)?;
        self.repo.list().await
    }

    async fn fetch(&self, id: Uuid) -> Result<Admin, AppError> {
        self.repo.find_by_id(&self.pool, id).await?.ok_or(AppError::AdminNotFound)
    }

    pub async fn update(&self, actor: Option<&Actor>, id: Uuid, payload: UpdateAdminPayload) -> Result<Admin, AppError> {
        let me = require_super_admin(actor)?;
        let current = self.fetch(id).await?;
        payload.validate()?;

        if let Some(email) = non_blank(payload.email.as_deref()) {
            if normalize_email(email) != normalize_email(&current.email) {
                return Err(AppError::EmailImmutable);
            }
        }
        if current.id == me && payload.status.is_some_and(|s| s != AccountStatus::Active) {
            return Err(AppError::CannotDeactivateSelf);
        }

        let password_hash = match non_blank(payload.password.as_deref()) {
            Some(p) => Some(hash_password(p).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let updated = self
            .repo
            .update_profile(
                &mut *tx,
                current.id,
                non_blank(payload.first_name.as_deref()),
                non_blank(payload.paternal_surname.as_deref()),
                non_blank(payload.maternal_surname.as_deref()),
                payload.status,
            )
            .await?
            .ok_or(AppError::AdminNotFound)?;
        if let Some(hash) = password_hash {
            self.repo.update_password(&mut *tx, current.id, &hash).await?;
        }
        tx.commit().await?;

        tracing::info!(admin_id = %updated.id, "Super usuário atualizado");
        Ok(updated)
    }

    pub async fn activate(&self, actor: Option<&Actor>, id: Uuid) -> Result<Admin, AppError> {
        require_super_admin(actor)?;
        self.change_status(id, AccountStatus::Active).await
    }

    /// Exclusão lógica. Ninguém se exclui.
    pub async fn delete(&self, actor: Option<&Actor>, id: Uuid) -> Result<Admin, AppError> {
        let me = require_super_admin(actor)?;
        if me == id {
            return Err(AppError::CannotDeactivateSelf);
        }
        self.change_status(id, AccountStatus::Inactive).await
    }

    async fn change_status(&self, id: Uuid, status: AccountStatus) -> Result<Admin, AppError> {
        let admin = self.fetch(id).await?;
        let updated = self
            .repo
            .set_status(&self.pool, admin.id, status)
            .await?
            .ok_or(AppError::AdminNotFound)?;
        tracing::info!(admin_id = %updated.id, ?status, "Status do super usuário alterado");
        Ok(updated)
    }
}
