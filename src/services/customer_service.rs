// src/services/customer_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        validation::{non_blank, normalize_email},
    },
    db::{customer_repo::CustomerFields, CustomerRepository, TenantRepository},
    models::{
        auth::AccountStatus,
        customer::{Customer, NewCustomerPayload, UpdateCustomerPayload},
    },
    services::{
        authorization::{authorize, owning_tenant_for_write, tenant_scope_for_listing, Action, Actor, Resource},
        security::hash_password,
    },
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { repo, tenant_repo, pool }
    }

    /// Cria o cliente dentro da microempresa informada (que precisa estar ativa).
    pub async fn create(&self, tenant_id: Uuid, payload: NewCustomerPayload) -> Result<Customer, AppError> {
        payload.validate()?;
        payload.validate_consistency()?;

        let email = normalize_email(&payload.email);
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        match self.tenant_repo.find_by_id(&mut *tx, tenant_id).await? {
            Some(tenant) if tenant.status == AccountStatus::Active => {}
            _ => return Err(AppError::InvalidTenant),
        }
        // E-mail único dentro da microempresa
        if !self.repo.find_by_email(&mut *tx, &email, Some(tenant_id)).await?.is_empty() {
            return Err(AppError::EmailAlreadyExists);
        }

        let fields = CustomerFields {
            first_name: payload.first_name.trim(),
            last_names: payload.last_names.trim(),
            business_name: if payload.is_company { non_blank(payload.business_name.as_deref()) } else { None },
            is_company: payload.is_company,
            is_generic: payload.is_generic,
        };
        let customer = self.repo.create(&mut *tx, tenant_id, fields, &email, &password_hash).await?;

        tx.commit().await?;

        tracing::info!(customer_id = %customer.id, %tenant_id, "Cliente criado");
        Ok(customer)
    }

    /// Criação autenticada: a microempresa sempre cria dentro de si mesma.
    pub async fn create_as(&self, actor: Option<&Actor>, payload: NewCustomerPayload) -> Result<Customer, AppError> {
        let tenant_id = owning_tenant_for_write(actor, payload.tenant_id)?;
        self.create(tenant_id, payload).await
    }

    pub async fn list(&self, actor: Option<&Actor>, tenant_filter: Option<Uuid>) -> Result<Vec<Customer>, AppError> {
        let scope = tenant_scope_for_listing(actor, tenant_filter)?;
        self.repo.list(scope).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Customer, AppError> {
        self.repo.find_by_id(&self.pool, id).await?.ok_or(AppError::CustomerNotFound)
    }

    fn resource(customer: &Customer) -> Resource {
        Resource::Customer { id: customer.id, tenant_id: customer.tenant_id }
    }

    pub async fn get(&self, actor: Option<&Actor>, id: Uuid) -> Result<Customer, AppError> {
        let customer = self.fetch(id).await?;
        authorize(actor, Action::Read, &Self::resource(&customer))?;
        Ok(customer)
    }

    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        payload: UpdateCustomerPayload,
    ) -> Result<Customer, AppError> {
        let current = self.fetch(id).await?;
        authorize(actor, Action::Write, &Self::resource(&current))?;
        payload.validate()?;

        if let Some(email) = non_blank(payload.email.as_deref()) {
            if normalize_email(email) != normalize_email(&current.email) {
                return Err(AppError::EmailImmutable);
            }
        }
        if payload.is_company.is_some_and(|is_company| is_company != current.is_company) {
            return Err(AppError::CustomerKindImmutable);
        }

        let business_name = match payload.business_name.as_deref() {
            Some(raw) => non_blank(Some(raw)),
            None => current.business_name.as_deref(),
        };
        if current.is_company && business_name.is_none() {
            return Err(AppError::CompanyNameRequired);
        }

        let fields = CustomerFields {
            first_name: non_blank(payload.first_name.as_deref()).unwrap_or(&current.first_name),
            last_names: payload.last_names.as_deref().map(str::trim).unwrap_or(&current.last_names),
            business_name: if current.is_company { business_name } else { None },
            is_company: current.is_company,
            is_generic: payload.is_generic.unwrap_or(current.is_generic),
        };
        let password_hash = match non_blank(payload.password.as_deref()) {
            Some(p) => Some(hash_password(p).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let updated = self.repo.update_profile(&mut *tx, current.id, fields).await?;
        if let Some(hash) = password_hash {
            self.repo.update_password(&mut *tx, current.id, &hash).await?;
        }
        tx.commit().await?;

        tracing::info!(customer_id = %updated.id, tenant_id = %updated.tenant_id, "Cliente atualizado");
        Ok(updated)
    }

    /// Desativação lógica; o próprio cliente também pode.
    pub async fn deactivate(&self, actor: Option<&Actor>, id: Uuid) -> Result<Customer, AppError> {
        self.change_status(actor, id, Action::Write, AccountStatus::Inactive).await
    }

    pub async fn activate(&self, actor: Option<&Actor>, id: Uuid) -> Result<Customer, AppError> {
        self.change_status(actor, id, Action::Manage, AccountStatus::Active).await
    }

    pub async fn delete(&self, actor: Option<&Actor>, id: Uuid) -> Result<Customer, AppError> {
        self.change_status(actor, id, Action::Manage, AccountStatus::Inactive).await
    }

    async fn change_status(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        action: Action,
        status: AccountStatus,
    ) -> Result<Customer, AppError> {
        let customer = self.fetch(id).await?;
        authorize(actor, action, &Self::resource(&customer))?;
        let updated = self
            .repo
            .set_status(&self.pool, customer.id, status)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        tracing::info!(customer_id = %updated.id, ?status, "Status do cliente alterado");
        Ok(updated)
    }
}
