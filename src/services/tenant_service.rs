// src/services/tenant_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        validation::{non_blank, normalize_email},
    },
    db::{tenant_repo::TenantFields, TenantRepository},
    models::{
        auth::AccountStatus,
        tenant::{
            parse_store_kind_flag, NewTenantPayload, StoreKind, StoreLocation, Tenant, TenantProfile,
            UpdateTenantPayload, VIRTUAL_ADDRESS_PLACEHOLDER,
        },
    },
    services::{
        authorization::{authorize, require_super_admin, Action, Actor, Resource},
        security::hash_password,
    },
};

#[derive(Clone)]
pub struct TenantService {
    repo: TenantRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(repo: TenantRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Cria a microempresa direto, sem passar pelo onboarding.
    /// Usado pelo cadastro público (já ativa) e pelo super usuário.
    pub async fn create(&self, payload: NewTenantPayload, status: AccountStatus) -> Result<Tenant, AppError> {
        payload.validate()?;

        let explicit = parse_store_kind_flag(payload.store_kind.as_deref())?;
        let location = StoreLocation::resolve(explicit, payload.address.as_deref(), payload.schedule.as_deref())?;
        let email = normalize_email(&payload.email);
        let business_name = payload.business_name.trim();
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        if self.repo.business_name_taken(&mut *tx, business_name, None).await? {
            return Err(AppError::BusinessNameAlreadyExists);
        }
        if self.repo.find_by_email(&mut *tx, &email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let fields = TenantFields {
            business_name,
            logo_url: non_blank(payload.logo_url.as_deref()),
            address: &location.address,
            schedule: &location.schedule,
            owner_first_name: payload.owner_first_name.trim(),
            owner_paternal_surname: payload.owner_paternal_surname.trim(),
            owner_maternal_surname: payload.owner_maternal_surname.trim(),
            email: &email,
        };
        let tenant = self.repo.create(&mut *tx, fields, &password_hash, status).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant.id, ?status, store_kind = ?location.kind, "Microempresa criada");
        Ok(tenant)
    }

    pub async fn create_as(&self, actor: Option<&Actor>, payload: NewTenantPayload) -> Result<TenantProfile, AppError> {
        require_super_admin(actor)?;
        Ok(self.create(payload, AccountStatus::Active).await?.into())
    }

    pub async fn list(&self, actor: Option<&Actor>) -> Result<Vec<TenantProfile>, AppError> {
        require_super_admin(actor)?;
        let tenants = self.repo.list().await?;
        Ok(tenants.into_iter().map(TenantProfile::from).collect())
    }

    async fn fetch(&self, id: Uuid) -> Result<Tenant, AppError> {
        self.repo.find_by_id(&self.pool, id).await?.ok_or(AppError::TenantNotFound)
    }

    pub async fn get(&self, actor: Option<&Actor>, id: Uuid) -> Result<TenantProfile, AppError> {
        let tenant = self.fetch(id).await?;
        authorize(actor, Action::Read, &Resource::Tenant { id: tenant.id })?;
        Ok(tenant.into())
    }

    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        payload: UpdateTenantPayload,
    ) -> Result<TenantProfile, AppError> {
        let current = self.fetch(id).await?;
        authorize(actor, Action::Write, &Resource::Tenant { id: current.id })?;
        payload.validate()?;

        if let Some(email) = non_blank(payload.email.as_deref()) {
            if normalize_email(email) != normalize_email(&current.email) {
                return Err(AppError::EmailImmutable);
            }
        }

        let location = merged_location(&current, &payload)?;
        let business_name = non_blank(payload.business_name.as_deref()).unwrap_or(&current.business_name);
        let logo_url = match payload.logo_url.as_deref() {
            Some(raw) => non_blank(Some(raw)),
            None => current.logo_url.as_deref(),
        };
        let password_hash = match non_blank(payload.password.as_deref()) {
            Some(p) => Some(hash_password(p).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        if self.repo.business_name_taken(&mut *tx, business_name, Some(current.id)).await? {
            return Err(AppError::BusinessNameAlreadyExists);
        }

        let fields = TenantFields {
            business_name,
            logo_url,
            address: &location.address,
            schedule: &location.schedule,
            owner_first_name: non_blank(payload.owner_first_name.as_deref()).unwrap_or(&current.owner_first_name),
            owner_paternal_surname: non_blank(payload.owner_paternal_surname.as_deref())
                .unwrap_or(&current.owner_paternal_surname),
            owner_maternal_surname: non_blank(payload.owner_maternal_surname.as_deref())
                .unwrap_or(&current.owner_maternal_surname),
            email: &current.email,
        };
        let updated = self.repo.update_profile(&mut *tx, current.id, fields).await?;
        if let Some(hash) = password_hash {
            self.repo.update_password(&mut *tx, current.id, &hash).await?;
        }

        tx.commit().await?;

        tracing::info!(tenant_id = %updated.id, store_kind = ?location.kind, "Microempresa atualizada");
        Ok(updated.into())
    }

    /// Desativação lógica: o super usuário ou a própria microempresa.
    pub async fn deactivate(&self, actor: Option<&Actor>, id: Uuid) -> Result<TenantProfile, AppError> {
        self.change_status(actor, id, Action::Write, AccountStatus::Inactive).await
    }

    pub async fn activate(&self, actor: Option<&Actor>, id: Uuid) -> Result<TenantProfile, AppError> {
        self.change_status(actor, id, Action::Manage, AccountStatus::Active).await
    }

    /// Exclusão lógica, só para o super usuário.
    pub async fn delete(&self, actor: Option<&Actor>, id: Uuid) -> Result<TenantProfile, AppError> {
        self.change_status(actor, id, Action::Manage, AccountStatus::Inactive).await
    }

    async fn change_status(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        action: Action,
        status: AccountStatus,
    ) -> Result<TenantProfile, AppError> {
        let tenant = self.fetch(id).await?;
        authorize(actor, action, &Resource::Tenant { id: tenant.id })?;
        let updated = self
            .repo
            .set_status(&self.pool, tenant.id, status)
            .await?
            .ok_or(AppError::TenantNotFound)?;
        tracing::info!(tenant_id = %updated.id, ?status, "Status da microempresa alterado");
        Ok(updated.into())
    }
}

/// Junta o que veio no PATCH com o que está gravado e recalcula o tipo de loja
/// pela mesma regra do cadastro.
fn merged_location(current: &Tenant, payload: &UpdateTenantPayload) -> Result<StoreLocation, AppError> {
    let explicit = parse_store_kind_flag(payload.store_kind.as_deref())?;
    let switching_to_virtual = explicit == Some(StoreKind::Virtual) && current.store_kind() == StoreKind::Physical;

    // Endereço/horário atuais só valem se continuarem coerentes com o novo tipo
    let address = match payload.address.as_deref() {
        Some(raw) => Some(raw),
        None if switching_to_virtual => None,
        None => Some(current.address.as_str()).filter(|a| *a != VIRTUAL_ADDRESS_PLACEHOLDER),
    };
    let schedule = match payload.schedule.as_deref() {
        Some(raw) => Some(raw),
        None if switching_to_virtual => None,
        None => Some(current.schedule.as_str()),
    };
    let explicit = explicit.or_else(|| {
        // Sem flag e sem mudança de endereço/horário, o tipo atual se mantém
        (payload.address.is_none() && payload.schedule.is_none()).then(|| current.store_kind())
    });

    StoreLocation::resolve(explicit, address, schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tenant(address: &str, schedule: &str) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            business_name: "Bodega Rosa".into(),
            logo_url: None,
            address: address.into(),
            schedule: schedule.into(),
            owner_first_name: "Rosa".into(),
            owner_paternal_surname: "Diaz".into(),
            owner_maternal_surname: "Paz".into(),
            email: "rosa@bodega.pe".into(),
            password_hash: String::new(),
            status: AccountStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn patch() -> UpdateTenantPayload {
        UpdateTenantPayload {
            business_name: None,
            logo_url: None,
            address: None,
            schedule: None,
            store_kind: None,
            owner_first_name: None,
            owner_paternal_surname: None,
            owner_maternal_surname: None,
            email: None,
            password: None,
        }
    }

    #[test]
    fn untouched_location_keeps_its_kind() {
        let physical = tenant("Av. Sol 1", "09:00 - 18:00");
        assert_eq!(merged_location(&physical, &patch()).unwrap().kind, StoreKind::Physical);

        let virtual_store = tenant(VIRTUAL_ADDRESS_PLACEHOLDER, "Atención online");
        let loc = merged_location(&virtual_store, &patch()).unwrap();
        assert_eq!(loc.kind, StoreKind::Virtual);
        assert_eq!(loc.address, VIRTUAL_ADDRESS_PLACEHOLDER);
    }

    #[test]
    fn switching_to_virtual_drops_the_opening_hours() {
        let physical = tenant("Av. Sol 1", "09:00 - 18:00");
        let mut p = patch();
        p.store_kind = Some("virtual".into());
        let loc = merged_location(&physical, &p).unwrap();
        assert_eq!(loc.kind, StoreKind::Virtual);
        assert_eq!(StoreKind::from_schedule(&loc.schedule), StoreKind::Virtual);
    }

    #[test]
    fn virtual_store_becomes_physical_only_with_a_real_address() {
        let virtual_store = tenant(VIRTUAL_ADDRESS_PLACEHOLDER, "Atención online");
        let mut p = patch();
        p.schedule = Some("08:00 - 16:00".into());
        assert!(matches!(merged_location(&virtual_store, &p), Err(AppError::PhysicalStoreRequiresAddress)));

        p.address = Some("Jr. Puno 45".into());
        let loc = merged_location(&virtual_store, &p).unwrap();
        assert_eq!(loc.kind, StoreKind::Physical);
        assert_eq!(loc.address, "Jr. Puno 45");
    }

    #[test]
    fn invalid_hours_on_physical_store_are_rejected() {
        let physical = tenant("Av. Sol 1", "09:00 - 18:00");
        let mut p = patch();
        p.schedule = Some("25:00 - 18:00".into());
        assert!(matches!(merged_location(&physical, &p), Err(AppError::InvalidSchedule)));
    }
}
