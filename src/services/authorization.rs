// src/services/authorization.rs

use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Principal};

/// Quem está agindo, reduzido ao que a política precisa saber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    SuperAdmin { id: Uuid },
    Tenant { id: Uuid },
    Customer { id: Uuid, tenant_id: Uuid },
}

impl From<&Principal> for Actor {
    fn from(principal: &Principal) -> Self {
        match principal {
            Principal::Admin(a) => Actor::SuperAdmin { id: a.id },
            Principal::Tenant(t) => Actor::Tenant { id: t.id },
            Principal::Customer(c) => Actor::Customer { id: c.id, tenant_id: c.tenant_id },
        }
    }
}

/// Recurso alvo, com o dono já resolvido a partir do banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Tenant { id: Uuid },
    Customer { id: Uuid, tenant_id: Uuid },
    Product { id: Uuid, tenant_id: Uuid },
    Admin { id: Uuid },
    /// Planos, fila de revisão e demais telas de administração.
    AdminArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    /// Ativar, excluir (lógico) e afins.
    Manage,
}

// ===========================================================================
// POLÍTICA
// ===========================================================================

/// Decide se `actor` pode executar `action` sobre `resource`.
/// Sem sessão: 401. Negado: 403, sempre com o mesmo erro.
pub fn authorize(actor: Option<&Actor>, action: Action, resource: &Resource) -> Result<(), AppError> {
    let actor = actor.ok_or(AppError::NotAuthenticated)?;

    let allowed = match (*actor, *resource) {
        (Actor::SuperAdmin { .. }, _) => true,

        (Actor::Tenant { id }, Resource::Tenant { id: target }) => id == target && action != Action::Manage,
        (Actor::Tenant { id }, Resource::Customer { tenant_id, .. }) => id == tenant_id,
        (Actor::Tenant { id }, Resource::Product { tenant_id, .. }) => id == tenant_id,

        (Actor::Customer { id, .. }, Resource::Customer { id: target, .. }) => {
            id == target && action != Action::Manage
        }

        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(?actor, ?action, ?resource, "Acesso negado pela política");
        Err(AppError::Forbidden)
    }
}

pub fn require_super_admin(actor: Option<&Actor>) -> Result<Uuid, AppError> {
    match actor {
        None => Err(AppError::NotAuthenticated),
        Some(Actor::SuperAdmin { id }) => Ok(*id),
        Some(_) => Err(AppError::Forbidden),
    }
}

/// Microempresa dona de um registro novo. Para a microempresa logada é sempre ela mesma,
/// independente do que veio no corpo; o super usuário precisa informar.
pub fn owning_tenant_for_write(actor: Option<&Actor>, requested: Option<Uuid>) -> Result<Uuid, AppError> {
    match actor {
        None => Err(AppError::NotAuthenticated),
        Some(Actor::SuperAdmin { .. }) => requested.ok_or_else(|| AppError::MissingFields("tenant_id".into())),
        Some(Actor::Tenant { id }) => Ok(*id),
        Some(Actor::Customer { .. }) => Err(AppError::Forbidden),
    }
}

/// Filtro de listagem: `None` = tudo (só super usuário).
pub fn tenant_scope_for_listing(actor: Option<&Actor>, requested: Option<Uuid>) -> Result<Option<Uuid>, AppError> {
    match actor {
        None => Err(AppError::NotAuthenticated),
        Some(Actor::SuperAdmin { .. }) => Ok(requested),
        Some(Actor::Tenant { id }) => Ok(Some(*id)),
        Some(Actor::Customer { .. }) => Err(AppError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn anonymous_requests_are_unauthenticated() {
        let err = authorize(None, Action::Read, &Resource::AdminArea).unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
    }

    #[test]
    fn super_admin_bypasses_scoping() {
        let admin = Actor::SuperAdmin { id: Uuid::new_v4() };
        let (a, b) = ids();
        for resource in [
            Resource::Tenant { id: a },
            Resource::Customer { id: a, tenant_id: b },
            Resource::Product { id: a, tenant_id: b },
            Resource::Admin { id: b },
            Resource::AdminArea,
        ] {
            for action in [Action::Read, Action::Write, Action::Manage] {
                assert!(authorize(Some(&admin), action, &resource).is_ok());
            }
        }
    }

    #[test]
    fn tenant_never_sees_another_tenants_customers() {
        let (tenant_a, tenant_b) = ids();
        let actor = Actor::Tenant { id: tenant_b };
        let customer_of_a = Resource::Customer { id: Uuid::new_v4(), tenant_id: tenant_a };
        for action in [Action::Read, Action::Write, Action::Manage] {
            assert!(matches!(authorize(Some(&actor), action, &customer_of_a), Err(AppError::Forbidden)));
        }
        let own = Resource::Customer { id: Uuid::new_v4(), tenant_id: tenant_b };
        assert!(authorize(Some(&actor), Action::Manage, &own).is_ok());
    }

    #[test]
    fn tenant_can_edit_itself_but_not_reactivate() {
        let (me, other) = ids();
        let actor = Actor::Tenant { id: me };
        assert!(authorize(Some(&actor), Action::Write, &Resource::Tenant { id: me }).is_ok());
        assert!(authorize(Some(&actor), Action::Manage, &Resource::Tenant { id: me }).is_err());
        assert!(authorize(Some(&actor), Action::Read, &Resource::Tenant { id: other }).is_err());
        assert!(authorize(Some(&actor), Action::Read, &Resource::AdminArea).is_err());
    }

    #[test]
    fn customer_only_reaches_its_own_record() {
        let (me, tenant) = ids();
        let actor = Actor::Customer { id: me, tenant_id: tenant };
        assert!(authorize(Some(&actor), Action::Write, &Resource::Customer { id: me, tenant_id: tenant }).is_ok());
        let neighbour = Resource::Customer { id: Uuid::new_v4(), tenant_id: tenant };
        assert!(authorize(Some(&actor), Action::Read, &neighbour).is_err());
        assert!(authorize(Some(&actor), Action::Read, &Resource::Tenant { id: tenant }).is_err());
        assert!(authorize(Some(&actor), Action::Read, &Resource::Product { id: me, tenant_id: tenant }).is_err());
    }

    #[test]
    fn tenant_writes_are_scoped_to_the_session_tenant() {
        let (me, spoofed) = ids();
        let actor = Actor::Tenant { id: me };
        assert_eq!(owning_tenant_for_write(Some(&actor), Some(spoofed)).unwrap(), me);
        assert_eq!(tenant_scope_for_listing(Some(&actor), Some(spoofed)).unwrap(), Some(me));
    }

    #[test]
    fn admin_must_name_the_tenant_for_new_records() {
        let admin = Actor::SuperAdmin { id: Uuid::new_v4() };
        assert!(matches!(owning_tenant_for_write(Some(&admin), None), Err(AppError::MissingFields(_))));
        assert_eq!(tenant_scope_for_listing(Some(&admin), None).unwrap(), None);
    }

    #[test]
    fn only_super_admin_passes_the_admin_gate() {
        let (a, b) = ids();
        assert_eq!(require_super_admin(Some(&Actor::SuperAdmin { id: a })).unwrap(), a);
        assert!(matches!(require_super_admin(Some(&Actor::Tenant { id: b })), Err(AppError::Forbidden)));
        assert!(matches!(require_super_admin(None), Err(AppError::NotAuthenticated)));
    }
}
