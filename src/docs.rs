// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::dashboard::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::guest_login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::auth::switch_role,

        // --- Password Reset ---
        handlers::password_reset::request_reset,
        handlers::password_reset::confirm_reset,

        // --- Onboarding ---
        handlers::onboarding::start,
        handlers::onboarding::select_plan,
        handlers::onboarding::submit,
        handlers::onboarding::status,
        handlers::onboarding::qr,
        handlers::onboarding::list_pending,
        handlers::onboarding::download_proof,
        handlers::onboarding::approve,
        handlers::onboarding::reject,

        // --- Planes ---
        handlers::plans::list_public_plans,
        handlers::plans::list_legacy_plans,
        handlers::plans::list_all_plans,
        handlers::plans::create_plan,
        handlers::plans::update_plan,
        handlers::plans::delete_plan,

        // --- Admins ---
        handlers::admins::list_admins,
        handlers::admins::create_admin,
        handlers::admins::update_admin,
        handlers::admins::activate_admin,
        handlers::admins::delete_admin,

        // --- Microempresas ---
        handlers::tenants::list_tenants,
        handlers::tenants::create_tenant,
        handlers::tenants::get_tenant,
        handlers::tenants::update_tenant,
        handlers::tenants::deactivate_tenant,
        handlers::tenants::activate_tenant,
        handlers::tenants::delete_tenant,

        // --- Clientes ---
        handlers::customers::list_customers,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::deactivate_customer,
        handlers::customers::activate_customer,
        handlers::customers::delete_customer,

        // --- Productos ---
        handlers::products::list_products,
        handlers::products::get_product,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::AccountStatus,
            models::auth::LoginPayload,
            models::auth::RegisterPayload,
            models::auth::SwitchRolePayload,
            models::auth::AuthResponse,
            models::auth::SelectRoleResponse,
            models::auth::MeResponse,
            models::auth::GuestResponse,
            models::auth::MessageResponse,
            models::auth::StatusChangeResponse,

            // --- Password Reset ---
            models::password_reset::ResetRequestPayload,
            models::password_reset::ResetConfirmPayload,
            models::password_reset::ResetRequestedResponse,

            // --- Onboarding ---
            models::onboarding::OnboardingState,
            models::onboarding::OnboardingRequest,
            models::onboarding::StartOnboardingPayload,
            models::onboarding::StartOnboardingResponse,
            models::onboarding::SelectPlanPayload,
            models::onboarding::SubmitOnboardingResponse,
            models::onboarding::OnboardingStatusResponse,
            models::onboarding::ReviewPayload,
            models::onboarding::PendingReview,

            // --- Subscriptions ---
            models::subscription::SubscriptionStatus,
            models::subscription::Subscription,
            models::subscription::ApprovalOutcome,
            models::subscription::RejectionOutcome,

            // --- Planes ---
            models::plan::CatalogStatus,
            models::plan::Plan,
            models::plan::PlanWithFeatures,
            models::plan::LegacyPlanList,
            models::plan::FeaturesInput,
            models::plan::CreatePlanPayload,
            models::plan::UpdatePlanPayload,

            // --- Admins ---
            models::admin::Admin,
            models::admin::NewAdminPayload,
            models::admin::UpdateAdminPayload,

            // --- Microempresas ---
            models::tenant::StoreKind,
            models::tenant::Tenant,
            models::tenant::TenantProfile,
            models::tenant::NewTenantPayload,
            models::tenant::UpdateTenantPayload,

            // --- Clientes ---
            models::customer::Customer,
            models::customer::NewCustomerPayload,
            models::customer::UpdateCustomerPayload,

            // --- Productos ---
            models::product::Product,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::AdminDashboard,
            models::dashboard::TenantDashboard,
            models::dashboard::CustomerDashboard,
            models::dashboard::StoreSummary,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Autenticação, Registro e Troca de Papel"),
        (name = "Password Reset", description = "Recuperação de Senha por Token"),
        (name = "Onboarding", description = "Cadastro de Microempresas e Revisão de Pagamento"),
        (name = "Planes", description = "Planos de Assinatura"),
        (name = "Admins", description = "Super Usuários"),
        (name = "Microempresas", description = "Gestão de Microempresas"),
        (name = "Clientes", description = "Clientes das Microempresas"),
        (name = "Productos", description = "Catálogo de Produtos"),
        (name = "Dashboard", description = "Resumo por Papel")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
