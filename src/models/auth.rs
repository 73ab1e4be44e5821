// src/models/auth.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{admin::Admin, customer::Customer, tenant::{Tenant, TenantProfile}};

// --- ENUMS ---

// Mapeia o CREATE TYPE principal_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "principal_role")]
pub enum Role {
    #[serde(rename = "super_usuario")]
    #[sqlx(rename = "super_usuario")]
    SuperAdmin,
    #[serde(rename = "microempresa")]
    #[sqlx(rename = "microempresa")]
    Tenant,
    #[serde(rename = "cliente")]
    #[sqlx(rename = "cliente")]
    Customer,
}

impl Role {
    /// Ordem canônica de apresentação dos papéis.
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Tenant, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_usuario",
            Role::Tenant => "microempresa",
            Role::Customer => "cliente",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        let raw = raw.trim().to_lowercase();
        Role::ALL.into_iter().find(|r| r.as_str() == raw)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Mapeia o CREATE TYPE account_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Pending,
}

// --- PRINCIPAL ---

/// Referência tipada a um principal: `microempresa:<uuid>`.
/// É o `sub` do JWT e o formato das identidades provadas no login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrincipalRef {
    pub role: Role,
    pub id: Uuid,
}

impl fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

impl FromStr for PrincipalRef {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (role, id) = s.split_once(':').ok_or(())?;
        let role = Role::parse(role).ok_or(())?;
        let id = Uuid::parse_str(id).map_err(|_| ())?;
        Ok(PrincipalRef { role, id })
    }
}

/// Um dos três tipos de conta. Cada variante vem da sua própria tabela.
#[derive(Debug, Clone)]
pub enum Principal {
    Admin(Admin),
    Tenant(Tenant),
    Customer(Customer),
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Admin(_) => Role::SuperAdmin,
            Principal::Tenant(_) => Role::Tenant,
            Principal::Customer(_) => Role::Customer,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Principal::Admin(a) => a.id,
            Principal::Tenant(t) => t.id,
            Principal::Customer(c) => c.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::Admin(a) => &a.email,
            Principal::Tenant(t) => &t.email,
            Principal::Customer(c) => &c.email,
        }
    }

    pub fn status(&self) -> AccountStatus {
        match self {
            Principal::Admin(a) => a.status,
            Principal::Tenant(t) => t.status,
            Principal::Customer(c) => c.status,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Principal::Admin(a) => &a.password_hash,
            Principal::Tenant(t) => &t.password_hash,
            Principal::Customer(c) => &c.password_hash,
        }
    }

    /// Microempresa à qual o principal pertence (a própria, no caso de tenant).
    pub fn tenant_id(&self) -> Option<Uuid> {
        match self {
            Principal::Admin(_) => None,
            Principal::Tenant(t) => Some(t.id),
            Principal::Customer(c) => Some(c.tenant_id),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == AccountStatus::Active
    }

    pub fn reference(&self) -> PrincipalRef {
        PrincipalRef { role: self.role(), id: self.id() }
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Principal::Admin(a) => a.serialize(serializer),
            Principal::Tenant(t) => TenantProfile::from(t.clone()).serialize(serializer),
            Principal::Customer(c) => c.serialize(serializer),
        }
    }
}

// --- JWT ---

/// Estrutura de dados ("claims") dentro do JWT.
/// `proven` guarda as identidades cuja senha foi verificada no login;
/// a troca de papel só pode escolher entre elas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub proven: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

pub const GUEST_SUBJECT: &str = "guest";

// --- PAYLOADS ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    /// Desempata clientes com o mesmo e-mail em microempresas diferentes.
    pub tenant_id: Option<Uuid>,
}

/// Cadastro público. Os demais campos dependem do papel
/// (`NewAdminPayload`, `NewTenantPayload` ou `NewCustomerPayload`).
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPayload {
    pub role: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchRolePayload {
    pub role: Option<String>,
    pub tenant_id: Option<Uuid>,
}

// --- RESPOSTAS ---

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    #[schema(value_type = Object)]
    pub user: Principal,
    pub role: Role,
    pub available_roles: Vec<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectRoleResponse {
    pub select_role: bool,
    pub roles: Vec<Role>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenants: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    #[schema(value_type = Option<Object>)]
    pub user: Option<Principal>,
    pub role: Option<Role>,
    pub available_roles: Vec<Role>,
    pub guest: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuestResponse {
    pub token: String,
    pub guest: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Resposta de ativar/desativar/excluir (sempre lógico).
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChangeResponse {
    pub message: String,
    pub id: Uuid,
    pub status: AccountStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_ref_round_trips_through_the_subject_string() {
        let id = Uuid::new_v4();
        let subject = PrincipalRef { role: Role::Tenant, id }.to_string();
        assert_eq!(subject, format!("microempresa:{id}"));
        assert_eq!(subject.parse::<PrincipalRef>(), Ok(PrincipalRef { role: Role::Tenant, id }));
    }

    #[test]
    fn malformed_subjects_are_rejected() {
        assert!("guest".parse::<PrincipalRef>().is_err());
        assert!("gerente:0b8f".parse::<PrincipalRef>().is_err());
        assert!("cliente:nao-e-uuid".parse::<PrincipalRef>().is_err());
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(Role::parse(" Cliente "), Some(Role::Customer));
        assert_eq!(Role::parse("super_usuario"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("admin"), None);
    }
}
