// src/services/identity.rs

use uuid::Uuid;

use crate::models::auth::{Principal, Role};

/// Papéis que podem autenticar, na ordem de apresentação.
/// Montado a partir da configuração e passado explicitamente aos serviços.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: Vec<Role>,
}

impl RoleRegistry {
    pub fn new(customer_login_enabled: bool) -> Self {
        let roles = Role::ALL
            .into_iter()
            .filter(|role| customer_login_enabled || *role != Role::Customer)
            .collect();
        Self { roles }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Papéis distintos de `roles`, na ordem do registro.
    pub fn ordered(&self, roles: impl IntoIterator<Item = Role>) -> Vec<Role> {
        let present: Vec<Role> = roles.into_iter().collect();
        self.roles.iter().copied().filter(|r| present.contains(r)).collect()
    }
}

/// Resultado da resolução de identidade no login.
#[derive(Debug)]
pub enum Resolution {
    /// Nenhum candidato ativo com a senha correta.
    NoMatch,
    Single(Principal),
    /// Mais de um candidato: o cliente precisa escolher o papel (e, para
    /// clientes em várias microempresas, a microempresa).
    Ambiguous { roles: Vec<Role>, tenants: Option<Vec<Uuid>> },
}

/// Escolhe o principal entre os candidatos já verificados (senha correta e conta ativa).
pub fn resolve(
    registry: &RoleRegistry,
    verified: &[Principal],
    requested_role: Option<Role>,
    requested_tenant: Option<Uuid>,
) -> Resolution {
    let candidates: Vec<&Principal> = verified
        .iter()
        .filter(|p| registry.contains(p.role()))
        .filter(|p| requested_role.is_none_or(|role| p.role() == role))
        .filter(|p| match (p, requested_tenant) {
            (Principal::Customer(c), Some(tenant_id)) => c.tenant_id == tenant_id,
            _ => true,
        })
        .collect();

    match candidates.as_slice() {
        [] => Resolution::NoMatch,
        [only] => Resolution::Single((*only).clone()),
        many => {
            let roles = registry.ordered(many.iter().map(|p| p.role()));
            let customer_tenants: Vec<Uuid> = many
                .iter()
                .filter_map(|p| match p {
                    Principal::Customer(c) => Some(c.tenant_id),
                    _ => None,
                })
                .collect();
            let tenants = (customer_tenants.len() > 1).then_some(customer_tenants);
            Resolution::Ambiguous { roles, tenants }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        auth::AccountStatus,
        customer::Customer,
        tenant::Tenant,
    };
    use chrono::Utc;

    fn tenant(email: &str) -> Principal {
        Principal::Tenant(Tenant {
            id: Uuid::new_v4(),
            business_name: "Bodega Rosa".into(),
            logo_url: None,
            address: "Av. Sol 1".into(),
            schedule: "09:00 - 18:00".into(),
            owner_first_name: "Rosa".into(),
            owner_paternal_surname: "Diaz".into(),
            owner_maternal_surname: "Paz".into(),
            email: email.into(),
            password_hash: String::new(),
            status: AccountStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn customer(email: &str, tenant_id: Uuid) -> Principal {
        Principal::Customer(Customer {
            id: Uuid::new_v4(),
            tenant_id,
            first_name: "Rosa".into(),
            last_names: "Diaz Paz".into(),
            business_name: None,
            is_company: false,
            is_generic: false,
            email: email.into(),
            password_hash: String::new(),
            status: AccountStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn no_candidates_means_no_match() {
        let registry = RoleRegistry::new(true);
        assert!(matches!(resolve(&registry, &[], None, None), Resolution::NoMatch));
    }

    #[test]
    fn tenant_and_customer_with_same_email_ask_for_role() {
        let registry = RoleRegistry::new(true);
        let t = tenant("x@y.com");
        let c = customer("x@y.com", Uuid::new_v4());
        match resolve(&registry, &[c, t], None, None) {
            Resolution::Ambiguous { roles, tenants } => {
                assert_eq!(roles, vec![Role::Tenant, Role::Customer]);
                assert!(tenants.is_none());
            }
            other => panic!("esperava ambiguidade, veio {other:?}"),
        }
    }

    #[test]
    fn requested_role_picks_the_matching_principal() {
        let registry = RoleRegistry::new(true);
        let t = tenant("x@y.com");
        let c = customer("x@y.com", Uuid::new_v4());
        match resolve(&registry, &[t, c], Some(Role::Customer), None) {
            Resolution::Single(p) => assert_eq!(p.role(), Role::Customer),
            other => panic!("esperava sessão, veio {other:?}"),
        }
    }

    #[test]
    fn requested_role_without_candidate_is_no_match() {
        let registry = RoleRegistry::new(true);
        let t = tenant("x@y.com");
        assert!(matches!(resolve(&registry, &[t], Some(Role::SuperAdmin), None), Resolution::NoMatch));
    }

    #[test]
    fn customers_in_several_tenants_need_a_tenant_choice() {
        let registry = RoleRegistry::new(true);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let verified = [customer("c@y.com", a), customer("c@y.com", b)];
        match resolve(&registry, &verified, None, None) {
            Resolution::Ambiguous { roles, tenants } => {
                assert_eq!(roles, vec![Role::Customer]);
                assert_eq!(tenants, Some(vec![a, b]));
            }
            other => panic!("esperava ambiguidade, veio {other:?}"),
        }
        match resolve(&registry, &verified, Some(Role::Customer), Some(b)) {
            Resolution::Single(p) => assert_eq!(p.tenant_id(), Some(b)),
            other => panic!("esperava sessão, veio {other:?}"),
        }
    }

    #[test]
    fn disabled_customer_login_hides_customers() {
        let registry = RoleRegistry::new(false);
        assert_eq!(registry.roles(), &[Role::SuperAdmin, Role::Tenant]);
        let c = customer("c@y.com", Uuid::new_v4());
        assert!(matches!(resolve(&registry, &[c], None, None), Resolution::NoMatch));
    }
}
