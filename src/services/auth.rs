// src/services/auth.rs

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::normalize_email},
    db::{AdminRepository, CustomerRepository, TenantRepository},
    models::{
        admin::NewAdminPayload,
        auth::{AccountStatus, Claims, Principal, PrincipalRef, Role, GUEST_SUBJECT},
        customer::NewCustomerPayload,
        tenant::NewTenantPayload,
    },
    services::{
        admin_service::AdminService,
        authorization::Actor,
        customer_service::CustomerService,
        identity::{resolve, Resolution, RoleRegistry},
        security::{hash_password, needs_rehash, verify_password},
        tenant_service::TenantService,
    },
};

/// Sessão resolvida a partir do JWT. `principal == None` é visitante.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Option<Principal>,
    /// Identidades com senha verificada no login; alvos válidos da troca de papel.
    pub proven: Vec<PrincipalRef>,
}

impl Session {
    pub fn is_guest(&self) -> bool {
        self.principal.is_none()
    }

    pub fn actor(&self) -> Option<Actor> {
        self.principal.as_ref().map(Actor::from)
    }
}

/// Token emitido junto com o principal ativo.
#[derive(Debug)]
pub struct IssuedSession {
    pub token: String,
    pub principal: Principal,
    pub available_roles: Vec<Role>,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(IssuedSession),
    /// Mais de uma conta bate: o cliente repete o login informando o papel.
    SelectRole { roles: Vec<Role>, tenants: Option<Vec<Uuid>> },
}

#[derive(Clone)]
pub struct AuthService {
    admin_repo: AdminRepository,
    tenant_repo: TenantRepository,
    customer_repo: CustomerRepository,
    admin_service: AdminService,
    tenant_service: TenantService,
    customer_service: CustomerService,
    registry: RoleRegistry,
    jwt_secret: String,
    jwt_exp_hours: i64,
    pool: PgPool,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        admin_repo: AdminRepository,
        tenant_repo: TenantRepository,
        customer_repo: CustomerRepository,
        admin_service: AdminService,
        tenant_service: TenantService,
        customer_service: CustomerService,
        registry: RoleRegistry,
        jwt_secret: String,
        jwt_exp_hours: i64,
        pool: PgPool,
    ) -> Self {
        Self {
            admin_repo,
            tenant_repo,
            customer_repo,
            admin_service,
            tenant_service,
            customer_service,
            registry,
            jwt_secret,
            jwt_exp_hours,
            pool,
        }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Papel pedido pelo cliente: precisa existir e estar habilitado.
    pub fn parse_role(&self, raw: Option<&str>) -> Result<Option<Role>, AppError> {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        let role = Role::parse(raw).ok_or(AppError::InvalidRole)?;
        if !self.registry.contains(role) {
            return Err(AppError::RoleNotAvailable);
        }
        Ok(Some(role))
    }

    // ===========================================================================
    // CADASTRO
    // ===========================================================================

    pub async fn register_admin(&self, payload: NewAdminPayload) -> Result<IssuedSession, AppError> {
        let admin = self.admin_service.register_first(payload).await?;
        self.issue(Principal::Admin(admin), &[])
    }

    /// Cadastro direto de microempresa: já nasce ativa.
    pub async fn register_tenant(&self, payload: NewTenantPayload) -> Result<IssuedSession, AppError> {
        let tenant = self.tenant_service.create(payload, AccountStatus::Active).await?;
        self.issue(Principal::Tenant(tenant), &[])
    }

    pub async fn register_customer(&self, payload: NewCustomerPayload) -> Result<IssuedSession, AppError> {
        if !self.registry.contains(Role::Customer) {
            return Err(AppError::RoleNotAvailable);
        }
        let tenant_id = payload.tenant_id.ok_or_else(|| AppError::MissingFields("tenant_id".into()))?;
        let customer = self.customer_service.create(tenant_id, payload).await?;
        self.issue(Principal::Customer(customer), &[])
    }

    // ===========================================================================
    // LOGIN
    // ===========================================================================

    /// Contas de todos os papéis registrados que podem corresponder ao identificador.
    /// Microempresas também são encontradas pelo nome do negócio.
    async fn candidates(&self, identifier: &str) -> Result<Vec<Principal>, AppError> {
        let email = normalize_email(identifier);
        let wants = |r: Role| self.registry.contains(r);
        let mut found = Vec::new();

        if wants(Role::SuperAdmin) {
            if let Some(admin) = self.admin_repo.find_by_email(&email).await? {
                found.push(Principal::Admin(admin));
            }
        }
        if wants(Role::Tenant) {
            match self.tenant_repo.find_by_email(&self.pool, &email).await? {
                Some(tenant) => found.push(Principal::Tenant(tenant)),
                None => {
                    let by_name = self.tenant_repo.find_by_business_name(identifier.trim()).await?;
                    found.extend(by_name.into_iter().map(Principal::Tenant));
                }
            }
        }
        if wants(Role::Customer) {
            let customers = self.customer_repo.find_by_email(&self.pool, &email, None).await?;
            found.extend(customers.into_iter().map(Principal::Customer));
        }
        Ok(found)
    }

    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        role: Option<Role>,
        tenant_id: Option<Uuid>,
    ) -> Result<LoginOutcome, AppError> {
        // `proven` cobre todo papel cuja senha confere; `role` só escolhe o principal da sessão
        let mut verified = Vec::new();
        for candidate in self.candidates(identifier).await? {
            if !candidate.is_active() {
                continue;
            }
            if verify_password(password, candidate.password_hash()).await? {
                verified.push(candidate);
            }
        }

        match resolve(&self.registry, &verified, role, tenant_id) {
            Resolution::NoMatch => {
                tracing::debug!(?role, "Login sem correspondência");
                Err(AppError::InvalidCredentials)
            }
            Resolution::Ambiguous { roles, tenants } => {
                tracing::info!(?roles, "Login ambíguo; pedindo escolha de papel");
                Ok(LoginOutcome::SelectRole { roles, tenants })
            }
            Resolution::Single(principal) => {
                self.upgrade_legacy_hashes(&verified, password).await?;
                let proven: Vec<PrincipalRef> = verified.iter().map(Principal::reference).collect();
                tracing::info!(role = %principal.role(), principal_id = %principal.id(), "🔑 Login efetuado");
                Ok(LoginOutcome::Authenticated(self.issue(principal, &proven)?))
            }
        }
    }

    /// Hash legado (sha256) é regravado com bcrypt depois de um login válido.
    async fn upgrade_legacy_hashes(&self, verified: &[Principal], password: &str) -> Result<(), AppError> {
        let legacy: Vec<&Principal> = verified.iter().filter(|p| needs_rehash(p.password_hash())).collect();
        if legacy.is_empty() {
            return Ok(());
        }
        let new_hash = hash_password(password).await?;
        for principal in legacy {
            match principal {
                Principal::Admin(a) => self.admin_repo.update_password(&self.pool, a.id, &new_hash).await?,
                Principal::Tenant(t) => self.tenant_repo.update_password(&self.pool, t.id, &new_hash).await?,
                Principal::Customer(c) => self.customer_repo.update_password(&self.pool, c.id, &new_hash).await?,
            }
            tracing::info!(role = %principal.role(), principal_id = %principal.id(), "Hash de senha legado atualizado");
        }
        Ok(())
    }

    // ===========================================================================
    // TROCA DE PAPEL
    // ===========================================================================

    /// Troca para outra identidade provada no login, sem pedir a senha de novo.
    pub async fn switch_role(
        &self,
        session: &Session,
        role: Role,
        tenant_id: Option<Uuid>,
    ) -> Result<IssuedSession, AppError> {
        let current = session.principal.as_ref().ok_or(AppError::NotAuthenticated)?;
        if !self.registry.contains(role) {
            return Err(AppError::RoleNotAvailable);
        }

        let mut targets = Vec::new();
        for reference in session.proven.iter().filter(|r| r.role == role) {
            let Some(principal) = self.load(*reference).await? else { continue };
            let same_email = normalize_email(principal.email()) == normalize_email(current.email());
            let tenant_matches = tenant_id.is_none_or(|t| principal.tenant_id() == Some(t) || role != Role::Customer);
            if principal.is_active() && same_email && tenant_matches {
                targets.push(principal);
            }
        }

        let target = match targets.len() {
            0 => return Err(AppError::RoleNotAvailable),
            1 => targets.remove(0),
            _ => return Err(AppError::MissingFields("tenant_id".into())),
        };

        tracing::info!(from = %current.role(), to = %target.role(), principal_id = %target.id(), "Troca de papel");
        self.issue(target, &session.proven)
    }

    // ===========================================================================
    // TOKENS
    // ===========================================================================

    pub fn guest_token(&self) -> Result<String, AppError> {
        self.encode_claims(GUEST_SUBJECT.to_string(), Vec::new())
    }

    /// Valida o JWT e recarrega o principal; conta inativa invalida a sessão.
    pub async fn authenticate(&self, token: &str) -> Result<Session, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        let claims = token_data.claims;

        let proven: Vec<PrincipalRef> = claims.proven.iter().filter_map(|s| s.parse().ok()).collect();

        if claims.sub == GUEST_SUBJECT {
            return Ok(Session { principal: None, proven: Vec::new() });
        }

        let reference: PrincipalRef = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;
        if !self.registry.contains(reference.role) {
            return Err(AppError::InvalidToken);
        }
        let principal = self
            .load(reference)
            .await?
            .filter(Principal::is_active)
            .ok_or(AppError::InvalidToken)?;

        Ok(Session { principal: Some(principal), proven })
    }

    /// Papéis que a sessão pode assumir, na ordem do registro.
    pub fn available_roles(&self, session: &Session) -> Vec<Role> {
        let current = session.principal.as_ref().map(Principal::role);
        self.registry
            .ordered(session.proven.iter().map(|r| r.role).chain(current))
    }

    async fn load(&self, reference: PrincipalRef) -> Result<Option<Principal>, AppError> {
        let principal = match reference.role {
            Role::SuperAdmin => self.admin_repo.find_by_id(&self.pool, reference.id).await?.map(Principal::Admin),
            Role::Tenant => self.tenant_repo.find_by_id(&self.pool, reference.id).await?.map(Principal::Tenant),
            Role::Customer => self
                .customer_repo
                .find_by_id(&self.pool, reference.id)
                .await?
                .map(Principal::Customer),
        };
        Ok(principal)
    }

    fn issue(&self, principal: Principal, proven: &[PrincipalRef]) -> Result<IssuedSession, AppError> {
        let mut proven = proven.to_vec();
        let reference = principal.reference();
        if !proven.contains(&reference) {
            proven.push(reference);
        }

        let token = self.encode_claims(
            reference.to_string(),
            proven.iter().map(ToString::to_string).collect(),
        )?;
        let available_roles = self.registry.ordered(proven.iter().map(|r| r.role));
        Ok(IssuedSession { token, principal, available_roles })
    }

    fn encode_claims(&self, sub: String, proven: Vec<String>) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.jwt_exp_hours);

        let claims = Claims {
            sub,
            proven,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
