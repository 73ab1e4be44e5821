// src/services/plan_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::non_blank},
    db::PlanRepository,
    models::plan::{
        normalize_features, parse_price, CatalogStatus, CreatePlanPayload, Plan, PlanWithFeatures,
        UpdatePlanPayload,
    },
    services::authorization::{require_super_admin, Actor},
};

#[derive(Clone)]
pub struct PlanService {
    repo: PlanRepository,
    pool: PgPool,
}

impl PlanService {
    pub fn new(repo: PlanRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    async fn with_features(&self, plans: Vec<Plan>) -> Result<Vec<PlanWithFeatures>, AppError> {
        let ids: Vec<Uuid> = plans.iter().map(|p| p.id).collect();
        let mut by_plan: HashMap<Uuid, Vec<String>> = HashMap::new();
        for feature in self.repo.features_for(&self.pool, &ids).await? {
            by_plan.entry(feature.plan_id).or_default().push(feature.text);
        }
        Ok(plans
            .into_iter()
            .map(|plan| {
                let features = by_plan.remove(&plan.id).unwrap_or_default();
                PlanWithFeatures { plan, features }
            })
            .collect())
    }

    /// Vitrine pública: só planos ativos, do mais barato ao mais caro.
    pub async fn list_public(&self) -> Result<Vec<PlanWithFeatures>, AppError> {
        let plans = self.repo.list(true).await?;
        self.with_features(plans).await
    }

    pub async fn list_all(&self, actor: Option<&Actor>) -> Result<Vec<PlanWithFeatures>, AppError> {
        require_super_admin(actor)?;
        let plans = self.repo.list(false).await?;
        self.with_features(plans).await
    }

    pub async fn create(&self, actor: Option<&Actor>, payload: CreatePlanPayload) -> Result<PlanWithFeatures, AppError> {
        require_super_admin(actor)?;

        let name = non_blank(payload.name.as_deref()).ok_or_else(|| AppError::MissingFields("name".into()))?;
        let price = parse_price(payload.price.as_ref())?;
        let status = payload.status.unwrap_or(CatalogStatus::Active);
        let features = normalize_features(payload.features.map(|f| f.into_items()).unwrap_or_default())?;

        let mut tx = self.pool.begin().await?;
        let plan = self.repo.create(&mut *tx, name, price, status).await?;
        self.repo.replace_features(&mut tx, plan.id, &features).await?;
        tx.commit().await?;

        tracing::info!(plan_id = %plan.id, name = %plan.name, features = features.len(), "Plano criado");
        Ok(PlanWithFeatures { plan, features })
    }

    /// PATCH parcial. `features` ausente mantém a lista; presente substitui inteira.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        payload: UpdatePlanPayload,
    ) -> Result<PlanWithFeatures, AppError> {
        require_super_admin(actor)?;
        let current = self.repo.find_by_id(&self.pool, id).await?.ok_or(AppError::PlanNotFound)?;

        let name = match payload.name.as_deref() {
            Some(raw) => non_blank(Some(raw)).ok_or_else(|| AppError::MissingFields("name".into()))?,
            None => current.name.as_str(),
        };
        let price = match payload.price.as_ref() {
            Some(raw) => parse_price(Some(raw))?,
            None => current.price,
        };
        let status = payload.status.unwrap_or(current.status);
        let features = payload
            .features
            .map(|f| normalize_features(f.into_items()))
            .transpose()?;

        let mut tx = self.pool.begin().await?;
        let plan = self
            .repo
            .update(&mut *tx, current.id, name, price, status)
            .await?
            .ok_or(AppError::PlanNotFound)?;
        if let Some(features) = &features {
            self.repo.replace_features(&mut tx, plan.id, features).await?;
        }
        tx.commit().await?;

        tracing::info!(plan_id = %plan.id, replaced_features = features.is_some(), "Plano atualizado");
        let mut listed = self.with_features(vec![plan]).await?;
        listed.pop().ok_or(AppError::PlanNotFound)
    }

    /// Exclusão lógica.
    pub async fn delete(&self, actor: Option<&Actor>, id: Uuid) -> Result<Plan, AppError> {
        require_super_admin(actor)?;
        let current = self.repo.find_by_id(&self.pool, id).await?.ok_or(AppError::PlanNotFound)?;
        let plan = self
            .repo
            .update(&self.pool, current.id, &current.name, current.price, CatalogStatus::Inactive)
            .await?
            .ok_or(AppError::PlanNotFound)?;
        tracing::info!(plan_id = %plan.id, "Plano desativado");
        Ok(plan)
    }
}
