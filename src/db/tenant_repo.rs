// src/db/tenant_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{auth::AccountStatus, tenant::Tenant},
};

/// Dados de perfil gravados em `tenants`, já validados pelo serviço.
#[derive(Debug, Clone, Copy)]
pub struct TenantFields<'a> {
    pub business_name: &'a str,
    pub logo_url: Option<&'a str>,
    pub address: &'a str,
    pub schedule: &'a str,
    pub owner_first_name: &'a str,
    pub owner_paternal_surname: &'a str,
    pub owner_maternal_surname: &'a str,
    pub email: &'a str,
}

// Repositório da tabela 'tenants' (microempresas)
#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(tenant)
    }

    /// Mesma busca, travando a linha até o fim da transação.
    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(tenant)
    }

    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(tenant)
    }

    /// Login de microempresa também aceita o nome do negócio como identificador.
    pub async fn find_by_business_name(&self, business_name: &str) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE LOWER(business_name) = LOWER($1) ORDER BY created_at",
        )
        .bind(business_name.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    /// Nome já usado por outra microempresa ativa ou pendente?
    pub async fn business_name_taken<'e, E>(
        &self,
        executor: E,
        business_name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenants
                WHERE LOWER(business_name) = LOWER($1)
                  AND status IN ('active', 'pending')
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(business_name.trim())
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;
        Ok(taken)
    }

    pub async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(tenants)
    }

    pub async fn list_active(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE status = 'active' ORDER BY business_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        fields: TenantFields<'_>,
        password_hash: &str,
        status: AccountStatus,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (
                business_name, logo_url, address, schedule,
                owner_first_name, owner_paternal_surname, owner_maternal_surname,
                email, password_hash, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(fields.business_name)
        .bind(fields.logo_url)
        .bind(fields.address)
        .bind(fields.schedule)
        .bind(fields.owner_first_name)
        .bind(fields.owner_paternal_surname)
        .bind(fields.owner_maternal_surname)
        .bind(fields.email)
        .bind(password_hash)
        .bind(status)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    /// Substitui o perfil inteiro. O e-mail só muda no fluxo de onboarding.
    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: TenantFields<'_>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET
                business_name = $2,
                logo_url = $3,
                address = $4,
                schedule = $5,
                owner_first_name = $6,
                owner_paternal_surname = $7,
                owner_maternal_surname = $8,
                email = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.business_name)
        .bind(fields.logo_url)
        .bind(fields.address)
        .bind(fields.schedule)
        .bind(fields.owner_first_name)
        .bind(fields.owner_paternal_surname)
        .bind(fields.owner_maternal_surname)
        .bind(fields.email)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn update_password<'e, E>(&self, executor: E, id: Uuid, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE tenants SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_password_by_email<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE tenants SET password_hash = $2, updated_at = NOW() WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .bind(password_hash)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(tenant)
    }
}
