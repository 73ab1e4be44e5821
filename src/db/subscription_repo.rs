// src/db/subscription_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::subscription::Subscription,
};

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Uma solicitação aprovada gera no máximo uma assinatura (índice único).
    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        plan_id: Uuid,
        onboarding_request_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Subscription, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (tenant_id, plan_id, onboarding_request_id, starts_at, ends_at, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(plan_id)
        .bind(onboarding_request_id)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn list_for_tenant(&self, tenant_id: Uuid) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE tenant_id = $1 ORDER BY starts_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscriptions)
    }
}
