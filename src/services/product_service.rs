// src/services/product_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::product::Product,
    services::authorization::{authorize, tenant_scope_for_listing, Action, Actor, Resource},
};

/// Catálogo de produtos, somente leitura.
#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
    pool: PgPool,
}

impl ProductService {
    pub fn new(repo: ProductRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self, actor: Option<&Actor>, tenant_filter: Option<Uuid>) -> Result<Vec<Product>, AppError> {
        let scope = tenant_scope_for_listing(actor, tenant_filter)?;
        self.repo.list(scope).await
    }

    pub async fn get(&self, actor: Option<&Actor>, id: Uuid) -> Result<Product, AppError> {
        let product = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        authorize(actor, Action::Read, &Resource::Product { id: product.id, tenant_id: product.tenant_id })?;
        Ok(product)
    }
}
