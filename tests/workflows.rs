// tests/workflows.rs
//
// Fluxos completos contra um Postgres real. Rodar com:
//   DATABASE_URL=postgres://... cargo test -- --ignored

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::PgPool;
use tempfile::TempDir;

use microempresa_backend::{
    common::error::AppError,
    config::{AppState, Settings},
    models::{
        admin::NewAdminPayload,
        auth::{AccountStatus, Role},
        customer::NewCustomerPayload,
        onboarding::{OnboardingState, ReviewDecision, StartOnboardingPayload},
        plan::{CreatePlanPayload, FeaturesInput, UpdatePlanPayload},
        tenant::{NewTenantPayload, StoreKind, VIRTUAL_ADDRESS_PLACEHOLDER, VIRTUAL_SCHEDULE_PLACEHOLDER},
    },
    services::{
        auth::LoginOutcome,
        authorization::Actor,
        mail_service::{MailMessage, Mailer},
        onboarding_service::{ReviewOutcome, StartMode},
        password_reset_service::{ResetConfirmation, ResetRequestOutcome},
    },
};

#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

impl CapturingMailer {
    /// O corpo em espanhol é "...: <token>\nExpira en ...".
    fn last_token(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let body = &sent.last().expect("nenhum e-mail enviado").body;
        let first_line = body.lines().next().unwrap_or_default();
        first_line.rsplit(": ").next().unwrap_or_default().trim().to_string()
    }
}

fn state(pool: PgPool, mailer: Arc<CapturingMailer>) -> (AppState, TempDir) {
    let uploads = tempfile::tempdir().unwrap();
    let mut settings = Settings::new("postgres://unused", "segredo-de-teste");
    settings.upload_folder = uploads.path().to_path_buf();
    let state = AppState::with_mailer(pool, settings, mailer).unwrap();
    (state, uploads)
}

fn signup(email: &str) -> StartOnboardingPayload {
    StartOnboardingPayload {
        signup_id: None,
        onboarding_token: None,
        business_name: Some("Panadería Lupita".into()),
        owner_first_name: Some("Lupita".into()),
        owner_paternal_surname: Some("Mamani".into()),
        owner_maternal_surname: Some("Quispe".into()),
        address: Some("Av. Siempre Viva 123".into()),
        schedule: Some("09:00 - 18:00".into()),
        email: Some(email.into()),
        password: Some("secreto".into()),
        logo_url: None,
        store_kind: None,
    }
}

fn tenant(name: &str, email: &str) -> NewTenantPayload {
    NewTenantPayload {
        business_name: name.into(),
        logo_url: None,
        address: None,
        schedule: None,
        store_kind: Some("virtual".into()),
        owner_first_name: "Dueño".into(),
        owner_paternal_surname: "Pérez".into(),
        owner_maternal_surname: "Gómez".into(),
        email: email.into(),
        password: "secreto".into(),
    }
}

fn admin() -> NewAdminPayload {
    NewAdminPayload {
        first_name: "Root".into(),
        paternal_surname: "Admin".into(),
        maternal_surname: "Sistema".into(),
        email: "root@example.com".into(),
        password: "secreto".into(),
    }
}

#[sqlx::test]
#[ignore = "precisa de DATABASE_URL"]
async fn onboarding_goes_from_signup_to_active_subscription(pool: PgPool) {
    let (app, _uploads) = state(pool.clone(), Arc::new(CapturingMailer::default()));
    let onboarding = &app.onboarding_service;

    let started = onboarding.start(&signup("lupita@example.com")).await.unwrap();
    assert_eq!(started.mode, StartMode::Created);
    let token = started.token.expect("token de edição").token;

    let plan = app.plan_service.list_public().await.unwrap().remove(0);

    // Token errado não envia nada
    let err = onboarding
        .submit(started.signup_id, plan.plan.id, Some("outro"), "comprobante.pdf", b"%PDF-1.4")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidOnboardingToken));

    let submitted = onboarding
        .submit(started.signup_id, plan.plan.id, Some(token.as_str()), "comprobante.pdf", b"%PDF-1.4")
        .await
        .unwrap();
    assert_eq!(submitted.state, OnboardingState::AwaitingReview);
    assert!(submitted.qr_text.as_deref().unwrap_or_default().contains(&started.signup_id.to_string()));

    // Depois do envio o cadastro fica travado
    let mut edit = signup("lupita@example.com");
    edit.signup_id = Some(started.signup_id);
    edit.onboarding_token = Some(token.clone());
    assert!(matches!(onboarding.start(&edit).await.unwrap_err(), AppError::OnboardingLocked));

    // Pendente não faz login
    let login = app.auth_service.login("lupita@example.com", "secreto", None, None).await;
    assert!(matches!(login, Err(AppError::InvalidCredentials)));

    let root = app.admin_service.register_first(admin()).await.unwrap();
    let outcome = onboarding
        .review(started.tenant_id, ReviewDecision::Approve, root.id, Some("ok"))
        .await
        .unwrap();
    let ReviewOutcome::Approved { request, subscription } = outcome else {
        panic!("esperava aprovação");
    };
    assert_eq!(request.state, OnboardingState::Approved);
    assert_eq!(subscription.tenant_id, started.tenant_id);
    assert_eq!(subscription.plan_id, plan.plan.id);
    assert_eq!(
        subscription.ends_at - subscription.starts_at,
        chrono::Duration::days(app.settings.subscription_default_days)
    );

    // Segunda decisão sobre o mesmo cadastro é transição inválida
    let again = onboarding.review(started.tenant_id, ReviewDecision::Reject, root.id, None).await;
    assert!(matches!(again, Err(AppError::InvalidTransition)));

    let (subscriptions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE tenant_id = $1")
        .bind(started.tenant_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(subscriptions, 1);

    match app.auth_service.login("lupita@example.com", "secreto", None, None).await.unwrap() {
        LoginOutcome::Authenticated(session) => assert_eq!(session.principal.role(), Role::Tenant),
        LoginOutcome::SelectRole { .. } => panic!("só existe uma conta"),
    }
}

#[sqlx::test]
#[ignore = "precisa de DATABASE_URL"]
async fn password_reset_token_is_single_use(pool: PgPool) {
    let mailer = Arc::new(CapturingMailer::default());
    let (app, _uploads) = state(pool, mailer.clone());

    app.tenant_service
        .create(tenant("Tienda Online", "tienda@example.com"), AccountStatus::Active)
        .await
        .unwrap();

    let outcome = app
        .password_reset_service
        .request(Some("tienda@example.com"), None, "es")
        .await
        .unwrap();
    assert_eq!(outcome, ResetRequestOutcome::Sent(Role::Tenant));
    let token = mailer.last_token();

    let confirm = || ResetConfirmation {
        email: Some("tienda@example.com"),
        role: Some("microempresa"),
        token: Some(token.as_str()),
        new_password: Some("nueva-clave"),
        confirm_password: Some("nueva-clave"),
    };
    app.password_reset_service.confirm(confirm()).await.unwrap();
    assert!(matches!(
        app.password_reset_service.confirm(confirm()).await,
        Err(AppError::InvalidResetToken)
    ));

    let login = app.auth_service.login("tienda@example.com", "nueva-clave", None, None).await.unwrap();
    assert!(matches!(login, LoginOutcome::Authenticated(_)));
}

#[sqlx::test]
#[ignore = "precisa de DATABASE_URL"]
async fn tenants_only_see_their_own_customers(pool: PgPool) {
    let (app, _uploads) = state(pool, Arc::new(CapturingMailer::default()));

    let a = app.tenant_service.create(tenant("Tienda A", "a@example.com"), AccountStatus::Active).await.unwrap();
    let b = app.tenant_service.create(tenant("Tienda B", "b@example.com"), AccountStatus::Active).await.unwrap();

    let customer = app
        .customer_service
        .create(
            b.id,
            NewCustomerPayload {
                tenant_id: None,
                first_name: "Ana".into(),
                last_names: "Quispe".into(),
                business_name: None,
                is_company: false,
                is_generic: false,
                email: "ana@example.com".into(),
                password: "secreto".into(),
            },
        )
        .await
        .unwrap();

    let actor_a = Actor::Tenant { id: a.id };
    let actor_b = Actor::Tenant { id: b.id };

    assert!(matches!(
        app.customer_service.get(Some(&actor_a), customer.id).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        app.customer_service.get(Some(&actor_a), uuid::Uuid::new_v4()).await,
        Err(AppError::CustomerNotFound)
    ));
    assert_eq!(app.customer_service.get(Some(&actor_b), customer.id).await.unwrap().id, customer.id);

    // Mesmo pedindo outra microempresa, a listagem fica no escopo da sessão
    let listed = app.customer_service.list(Some(&actor_a), Some(b.id)).await.unwrap();
    assert!(listed.is_empty());
}

#[sqlx::test]
#[ignore = "precisa de DATABASE_URL"]
async fn plan_update_replaces_the_whole_feature_list(pool: PgPool) {
    let (app, _uploads) = state(pool.clone(), Arc::new(CapturingMailer::default()));
    let root = app.admin_service.register_first(admin()).await.unwrap();
    let actor = Actor::SuperAdmin { id: root.id };

    let created = app
        .plan_service
        .create(
            Some(&actor),
            CreatePlanPayload {
                name: Some("Plan Test".into()),
                price: Some(serde_json::json!(80)),
                status: None,
                features: Some(FeaturesInput::List(vec!["a".into(), "b".into()])),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.features, vec!["a", "b"]);

    let updated = app
        .plan_service
        .update(
            Some(&actor),
            created.plan.id,
            UpdatePlanPayload {
                name: None,
                price: None,
                status: None,
                features: Some(FeaturesInput::List(vec!["c".into()])),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.features, vec!["c"]);

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plan_features WHERE plan_id = $1")
        .bind(created.plan.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    // Sem `features` a lista fica como está
    let renamed = app
        .plan_service
        .update(
            Some(&actor),
            created.plan.id,
            UpdatePlanPayload { name: Some("Plan Test 2".into()), price: None, status: None, features: None },
        )
        .await
        .unwrap();
    assert_eq!(renamed.features, vec!["c"]);
}

#[sqlx::test]
#[ignore = "precisa de DATABASE_URL"]
async fn shared_email_login_can_switch_between_roles(pool: PgPool) {
    let (app, _uploads) = state(pool, Arc::new(CapturingMailer::default()));

    let shop = app
        .tenant_service
        .create(tenant("Tienda Dual", "dual@example.com"), AccountStatus::Active)
        .await
        .unwrap();
    app.customer_service
        .create(
            shop.id,
            NewCustomerPayload {
                tenant_id: None,
                first_name: "Dual".into(),
                last_names: "Cliente".into(),
                business_name: None,
                is_company: false,
                is_generic: false,
                email: "dual@example.com".into(),
                password: "secreto".into(),
            },
        )
        .await
        .unwrap();

    match app.auth_service.login("dual@example.com", "secreto", None, None).await.unwrap() {
        LoginOutcome::SelectRole { roles, .. } => assert_eq!(roles, vec![Role::Tenant, Role::Customer]),
        LoginOutcome::Authenticated(_) => panic!("duas contas com a mesma senha"),
    }

    let LoginOutcome::Authenticated(as_customer) = app
        .auth_service
        .login("dual@example.com", "secreto", Some(Role::Customer), None)
        .await
        .unwrap()
    else {
        panic!("papel escolhido deve autenticar");
    };
    assert_eq!(as_customer.principal.role(), Role::Customer);
    assert_eq!(as_customer.available_roles, vec![Role::Tenant, Role::Customer]);

    let session = app.auth_service.authenticate(&as_customer.token).await.unwrap();
    let switched = app.auth_service.switch_role(&session, Role::Tenant, None).await.unwrap();
    assert_eq!(switched.principal.role(), Role::Tenant);
    assert_eq!(switched.principal.id(), shop.id);
}

#[sqlx::test]
#[ignore = "precisa de DATABASE_URL"]
async fn blank_location_registers_a_virtual_store(pool: PgPool) {
    let (app, _uploads) = state(pool, Arc::new(CapturingMailer::default()));

    let mut payload = tenant("Tienda Sin Local", "sinlocal@example.com");
    payload.store_kind = None;
    payload.address = Some("".into());
    payload.schedule = Some("".into());

    let created = app.tenant_service.create(payload, AccountStatus::Active).await.unwrap();
    assert_eq!(created.store_kind(), StoreKind::Virtual);
    assert_eq!(created.address, VIRTUAL_ADDRESS_PLACEHOLDER);
    assert_eq!(created.schedule, VIRTUAL_SCHEDULE_PLACEHOLDER);
}
