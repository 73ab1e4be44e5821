// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        AdminRepository, CustomerRepository, DashboardRepository, OnboardingRepository,
        PasswordResetRepository, PlanRepository, ProductRepository, SubscriptionRepository,
        TenantRepository,
    },
    services::{
        admin_service::AdminService,
        auth::AuthService,
        customer_service::CustomerService,
        dashboard_service::DashboardService,
        identity::RoleRegistry,
        mail_service::{HttpRelayMailer, LogMailer, Mailer},
        onboarding_service::OnboardingService,
        password_reset_service::PasswordResetService,
        plan_service::PlanService,
        product_service::ProductService,
        security::TokenHasher,
        storage_service::ProofStorage,
        tenant_service::TenantService,
    },
};

// ===========================================================================
// CONFIGURAÇÃO (variáveis de ambiente)
// ===========================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    /// Chave do HMAC dos tokens de uso único.
    pub token_hash_secret: String,
    pub jwt_exp_hours: i64,
    pub bind_addr: String,
    pub frontend_origins: Vec<String>,
    pub upload_folder: PathBuf,
    pub max_content_length: usize,
    pub onboarding_token_expire_minutes: i64,
    pub subscription_default_days: i64,
    pub reset_token_expire_minutes: i64,
    pub customer_login_enabled: bool,
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Settings {
    /// Valores padrão para tudo que não é obrigatório.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        let jwt_secret = jwt_secret.into();
        Self {
            database_url: database_url.into(),
            token_hash_secret: jwt_secret.clone(),
            jwt_secret,
            jwt_exp_hours: 24 * 7,
            bind_addr: "0.0.0.0:3000".into(),
            frontend_origins: vec!["http://localhost:3000".into(), "http://localhost:3001".into()],
            upload_folder: PathBuf::from("uploads"),
            max_content_length: 10 * 1024 * 1024,
            onboarding_token_expire_minutes: 120,
            subscription_default_days: 30,
            reset_token_expire_minutes: 15,
            customer_login_enabled: true,
            mail_relay_url: None,
            mail_from: "no-reply@microempresa.local".into(),
            admin_email: None,
            admin_password: None,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let mut settings = Self::new(database_url, jwt_secret);

        if let Ok(secret) = env::var("TOKEN_HASH_SECRET") {
            settings.token_hash_secret = secret;
        }
        if let Ok(addr) = env::var("BIND_ADDR") {
            settings.bind_addr = addr;
        }
        if let Ok(origins) = env::var("FRONTEND_ORIGIN") {
            let mut list: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect();
            for dev in ["http://localhost:3000", "http://localhost:3001"] {
                if !list.iter().any(|o| o == dev) {
                    list.push(dev.to_string());
                }
            }
            settings.frontend_origins = list;
        }
        if let Ok(folder) = env::var("UPLOAD_FOLDER") {
            settings.upload_folder = PathBuf::from(folder);
        }

        settings.jwt_exp_hours = env_parse("JWT_EXP_HOURS", settings.jwt_exp_hours)?;
        settings.max_content_length = env_parse("MAX_CONTENT_LENGTH", settings.max_content_length)?;
        settings.onboarding_token_expire_minutes =
            env_parse("ONBOARDING_TOKEN_EXPIRE_MINUTES", settings.onboarding_token_expire_minutes)?;
        settings.subscription_default_days =
            env_parse("SUBSCRIPTION_DEFAULT_DAYS", settings.subscription_default_days)?;
        settings.reset_token_expire_minutes =
            env_parse("RESET_TOKEN_EXPIRE_MINUTES", settings.reset_token_expire_minutes)?;
        settings.customer_login_enabled = env_flag("CUSTOMER_LOGIN_ENABLED", settings.customer_login_enabled);

        settings.mail_relay_url = env::var("MAIL_RELAY_URL").ok().filter(|v| !v.trim().is_empty());
        if let Ok(from) = env::var("MAIL_FROM") {
            settings.mail_from = from;
        }
        settings.admin_email = env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty());
        settings.admin_password = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());

        Ok(settings)
    }
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on" | "si"),
        Err(_) => default,
    }
}

// ===========================================================================
// ESTADO DA APLICAÇÃO
// ===========================================================================

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub onboarding_service: OnboardingService,
    pub password_reset_service: PasswordResetService,
    pub plan_service: PlanService,
    pub tenant_service: TenantService,
    pub customer_service: CustomerService,
    pub admin_service: AdminService,
    pub product_service: ProductService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    /// Conecta ao banco e monta o grafo de dependências.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, settings)
    }

    /// Monta o estado sobre uma pool já criada (também usado pelos testes).
    pub fn from_pool(db_pool: PgPool, settings: Settings) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = match &settings.mail_relay_url {
            Some(url) => Arc::new(HttpRelayMailer::new(url.clone())?),
            None => {
                tracing::warn!("MAIL_RELAY_URL não definida; e-mails só serão registrados no log.");
                Arc::new(LogMailer)
            }
        };
        Self::with_mailer(db_pool, settings, mailer)
    }

    pub fn with_mailer(db_pool: PgPool, settings: Settings, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let i18n_store = Arc::new(I18nStore::load()?);
        let hasher = TokenHasher::new(&settings.token_hash_secret)?;
        let registry = RoleRegistry::new(settings.customer_login_enabled);
        let storage = ProofStorage::new(settings.upload_folder.clone());

        // --- Repositórios ---
        let admin_repo = AdminRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let plan_repo = PlanRepository::new(db_pool.clone());
        let onboarding_repo = OnboardingRepository::new(db_pool.clone());
        let subscription_repo = SubscriptionRepository::new(db_pool.clone());
        let reset_repo = PasswordResetRepository::new();
        let product_repo = ProductRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        // --- Serviços ---
        let onboarding_service = OnboardingService::new(
            tenant_repo.clone(),
            onboarding_repo.clone(),
            plan_repo.clone(),
            subscription_repo.clone(),
            storage,
            hasher.clone(),
            settings.onboarding_token_expire_minutes,
            settings.subscription_default_days,
            db_pool.clone(),
        );
        let password_reset_service = PasswordResetService::new(
            reset_repo,
            admin_repo.clone(),
            tenant_repo.clone(),
            customer_repo.clone(),
            registry.clone(),
            hasher,
            mailer,
            i18n_store.clone(),
            settings.mail_from.clone(),
            settings.reset_token_expire_minutes,
            db_pool.clone(),
        );
        let plan_service = PlanService::new(plan_repo, db_pool.clone());
        let tenant_service = TenantService::new(tenant_repo.clone(), db_pool.clone());
        let customer_service = CustomerService::new(customer_repo.clone(), tenant_repo.clone(), db_pool.clone());
        let admin_service = AdminService::new(admin_repo.clone(), db_pool.clone());
        let auth_service = AuthService::new(
            admin_repo,
            tenant_repo.clone(),
            customer_repo,
            admin_service.clone(),
            tenant_service.clone(),
            customer_service.clone(),
            registry,
            settings.jwt_secret.clone(),
            settings.jwt_exp_hours,
            db_pool.clone(),
        );
        let product_service = ProductService::new(product_repo, db_pool.clone());
        let dashboard_service = DashboardService::new(dashboard_repo, tenant_repo, subscription_repo);

        Ok(Self {
            db_pool,
            settings,
            i18n_store,
            auth_service,
            onboarding_service,
            password_reset_service,
            plan_service,
            tenant_service,
            customer_service,
            admin_service,
            product_service,
            dashboard_service,
        })
    }
}
