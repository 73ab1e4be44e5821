// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{auth::AccountStatus, customer::Customer},
};

#[derive(Debug, Clone, Copy)]
pub struct CustomerFields<'a> {
    pub first_name: &'a str,
    pub last_names: &'a str,
    pub business_name: Option<&'a str>,
    pub is_company: bool,
    pub is_generic: bool,
}

// Repositório da tabela 'customers'. Todo cliente pertence a uma microempresa.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    /// O mesmo e-mail pode existir em várias microempresas.
    pub async fn find_by_email<'e, E>(
        &self,
        executor: E,
        email: &str,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE LOWER(email) = LOWER($1)
              AND ($2::uuid IS NULL OR tenant_id = $2)
            ORDER BY created_at
            "#,
        )
        .bind(email)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }

    pub async fn list(&self, tenant_id: Option<Uuid>) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        fields: CustomerFields<'_>,
        email: &str,
        password_hash: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                tenant_id, first_name, last_names, business_name,
                is_company, is_generic, email, password_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(fields.first_name)
        .bind(fields.last_names)
        .bind(fields.business_name)
        .bind(fields.is_company)
        .bind(fields.is_generic)
        .bind(email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                first_name = $2,
                last_names = $3,
                business_name = $4,
                is_company = $5,
                is_generic = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.first_name)
        .bind(fields.last_names)
        .bind(fields.business_name)
        .bind(fields.is_company)
        .bind(fields.is_generic)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    pub async fn update_password<'e, E>(&self, executor: E, id: Uuid, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE customers SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Atualiza todas as contas de cliente com esse e-mail (a caixa de correio prova a posse de todas).
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
            "UPDATE customers SET password_hash = $2, updated_at = NOW() WHERE LOWER(email) = LOWER($1)",
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
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "UPDATE customers SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }
}
