// src/db/admin_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{admin::Admin, auth::AccountStatus},
};

// Repositório da tabela 'admins' (super usuários)
#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Admin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(admin)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn list(&self) -> Result<Vec<Admin>, AppError> {
        let admins = sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(admins)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        first_name: &str,
        paternal_surname: &str,
        maternal_surname: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (first_name, paternal_surname, maternal_surname, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(first_name)
        .bind(paternal_surname)
        .bind(maternal_surname)
        .bind(email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    /// Atualiza os campos informados; `None` mantém o valor atual.
    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        first_name: Option<&str>,
        paternal_surname: Option<&str>,
        maternal_surname: Option<&str>,
        status: Option<AccountStatus>,
    ) -> Result<Option<Admin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins SET
                first_name = COALESCE($2, first_name),
                paternal_surname = COALESCE($3, paternal_surname),
                maternal_surname = COALESCE($4, maternal_surname),
                status = COALESCE($5, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(paternal_surname)
        .bind(maternal_surname)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(admin)
    }

    pub async fn update_password<'e, E>(&self, executor: E, id: Uuid, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE admins SET password_hash = $2, updated_at = NOW() WHERE id = $1")
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
            "UPDATE admins SET password_hash = $2, updated_at = NOW() WHERE LOWER(email) = LOWER($1)",
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
    ) -> Result<Option<Admin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let admin = sqlx::query_as::<_, Admin>(
            "UPDATE admins SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(admin)
    }
}
