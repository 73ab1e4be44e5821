// src/db/onboarding_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::onboarding::{OnboardingRequest, OnboardingState, PendingReview},
};

// Repositório de 'onboarding_requests'. As transições de estado são
// compare-and-set: o UPDATE só acontece se o estado atual for o esperado.
#[derive(Clone)]
pub struct OnboardingRepository {
    pool: PgPool,
}

impl OnboardingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        token_hash: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<OnboardingRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, OnboardingRequest>(
            r#"
            INSERT INTO onboarding_requests (tenant_id, token_hash, token_expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(token_hash)
        .bind(token_expires_at)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<OnboardingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, OnboardingRequest>("SELECT * FROM onboarding_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    /// A solicitação vigente de uma microempresa é sempre a mais recente.
    pub async fn find_latest_for_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Option<OnboardingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, OnboardingRequest>(
            r#"
            SELECT * FROM onboarding_requests
            WHERE tenant_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    /// Troca o token de edição (o anterior deixa de valer).
    pub async fn replace_token<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        token_hash: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<Option<OnboardingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, OnboardingRequest>(
            r#"
            UPDATE onboarding_requests
            SET token_hash = $2, token_expires_at = $3
            WHERE id = $1 AND state IN ('draft', 'plan_selected')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(token_expires_at)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    /// draft | plan_selected -> plan_selected
    pub async fn select_plan<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<OnboardingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, OnboardingRequest>(
            r#"
            UPDATE onboarding_requests
            SET plan_id = $2, state = 'plan_selected'
            WHERE id = $1 AND state IN ('draft', 'plan_selected')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(plan_id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    /// draft | plan_selected -> awaiting_review. O texto do QR só é gravado se ainda não existir.
    pub async fn submit<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        plan_id: Uuid,
        proof_path: &str,
        qr_text: &str,
    ) -> Result<Option<OnboardingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, OnboardingRequest>(
            r#"
            UPDATE onboarding_requests
            SET plan_id = $2,
                proof_path = $3,
                qr_text = COALESCE(qr_text, $4),
                state = 'awaiting_review'
            WHERE id = $1 AND state IN ('draft', 'plan_selected')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(plan_id)
        .bind(proof_path)
        .bind(qr_text)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    /// awaiting_review -> approved | rejected, carimbando a revisão.
    /// Aprovação exige plano escolhido.
    pub async fn review<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        target: OnboardingState,
        reviewer_id: Uuid,
        note: Option<&str>,
    ) -> Result<Option<OnboardingRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, OnboardingRequest>(
            r#"
            UPDATE onboarding_requests
            SET state = $2,
                reviewed_by = $3,
                reviewed_at = NOW(),
                review_note = $4
            WHERE id = $1
              AND state = 'awaiting_review'
              AND ($2 <> 'approved'::onboarding_state OR plan_id IS NOT NULL)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(target)
        .bind(reviewer_id)
        .bind(note)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    /// Fila de revisão: solicitações aguardando, com microempresa e plano.
    pub async fn list_pending(&self) -> Result<Vec<PendingReview>, AppError> {
        let rows = sqlx::query_as::<_, PendingReview>(
            r#"
            SELECT
                r.id AS signup_id,
                r.tenant_id,
                t.business_name,
                t.email,
                t.owner_first_name,
                t.owner_paternal_surname,
                r.plan_id,
                p.name AS plan_name,
                p.price AS plan_price,
                r.qr_text,
                r.created_at
            FROM onboarding_requests r
            JOIN tenants t ON t.id = r.tenant_id
            LEFT JOIN plans p ON p.id = r.plan_id
            WHERE r.state = 'awaiting_review'
            ORDER BY r.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
