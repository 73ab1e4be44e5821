// src/db/plan_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::plan::{CatalogStatus, Plan, PlanFeature},
};

#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Plan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(plan)
    }

    /// Lista planos por preço; `only_active` para a vitrine pública.
    pub async fn list(&self, only_active: bool) -> Result<Vec<Plan>, AppError> {
        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT * FROM plans
            WHERE ($1 = FALSE OR status = 'active')
            ORDER BY price ASC, name ASC
            "#,
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    /// Características de vários planos, já ordenadas por posição.
    pub async fn features_for<'e, E>(&self, executor: E, plan_ids: &[Uuid]) -> Result<Vec<PlanFeature>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let features = sqlx::query_as::<_, PlanFeature>(
            "SELECT * FROM plan_features WHERE plan_id = ANY($1) ORDER BY plan_id, position, id",
        )
        .bind(plan_ids)
        .fetch_all(executor)
        .await?;
        Ok(features)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        price: Decimal,
        status: CatalogStatus,
    ) -> Result<Plan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Plan>(
            "INSERT INTO plans (name, price, status) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(price)
        .bind(status)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        price: Decimal,
        status: CatalogStatus,
    ) -> Result<Option<Plan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Plan>(
            r#"
            UPDATE plans SET name = $2, price = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(price)
        .bind(status)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)
    }

    /// Apaga todas as características do plano e grava a nova lista na ordem dada.
    /// Recebe a conexão da transação porque executa dois comandos.
    pub async fn replace_features(
        &self,
        conn: &mut PgConnection,
        plan_id: Uuid,
        features: &[String],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM plan_features WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&mut *conn)
            .await?;

        if features.is_empty() {
            return Ok(());
        }

        let positions: Vec<i32> = (0..features.len() as i32).collect();
        sqlx::query(
            r#"
            INSERT INTO plan_features (plan_id, text, position)
            SELECT $1, f.text, f.position
            FROM UNNEST($2::text[], $3::int4[]) AS f(text, position)
            "#,
        )
        .bind(plan_id)
        .bind(features)
        .bind(&positions)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
