// src/db/dashboard_repo.rs

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{common::error::AppError, models::dashboard::AdminDashboard};

// Consultas agregadas do painel. Só leitura, direto na pool.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn admin_summary(&self) -> Result<AdminDashboard, AppError> {
        let summary = sqlx::query_as::<_, AdminDashboard>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tenants) AS tenants_total,
                (SELECT COUNT(*) FROM tenants WHERE status = 'active') AS tenants_active,
                (SELECT COUNT(*) FROM tenants WHERE status = 'pending') AS tenants_pending,
                (SELECT COUNT(*) FROM customers) AS customers_total,
                (SELECT COUNT(*) FROM admins) AS admins_total,
                (SELECT COUNT(*) FROM onboarding_requests WHERE state = 'awaiting_review') AS pending_reviews
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    /// (produtos, produtos abaixo do mínimo, clientes) de uma microempresa.
    pub async fn tenant_counts(&self, tenant_id: Uuid) -> Result<(i64, i64, i64), AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE tenant_id = $1 AND status = 'active') AS products_total,
                (SELECT COUNT(*) FROM products
                    WHERE tenant_id = $1 AND status = 'active' AND stock <= min_stock) AS products_low_stock,
                (SELECT COUNT(*) FROM customers WHERE tenant_id = $1) AS customers_total
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((
            row.try_get("products_total")?,
            row.try_get("products_low_stock")?,
            row.try_get("customers_total")?,
        ))
    }
}
