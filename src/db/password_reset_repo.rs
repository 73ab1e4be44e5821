// src/db/password_reset_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{auth::Role, password_reset::PasswordResetToken},
};

/// Todas as operações rodam dentro da transação do serviço, por isso não guarda pool.
#[derive(Clone, Default)]
pub struct PasswordResetRepository;

impl PasswordResetRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        email: &str,
        role: Role,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let token = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (email, role, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(role)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(executor)
        .await?;
        Ok(token)
    }

    /// Token mais recente, não usado e não expirado, que bate com (email, papel, hash).
    /// Trava a linha para que dois pedidos simultâneos não consumam o mesmo token.
    pub async fn find_usable_for_update<'e, E>(
        &self,
        executor: E,
        email: &str,
        role: Role,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let token = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT * FROM password_reset_tokens
            WHERE email = $1 AND role = $2 AND token_hash = $3
              AND used_at IS NULL AND expires_at > $4
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(email)
        .bind(role)
        .bind(token_hash)
        .bind(now)
        .fetch_optional(executor)
        .await?;
        Ok(token)
    }

    /// Marca como usado; devolve `false` se outro pedido já o consumiu.
    pub async fn mark_used<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
