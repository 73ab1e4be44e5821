// src/db.rs

pub mod admin_repo;
pub mod customer_repo;
pub mod dashboard_repo;
pub mod onboarding_repo;
pub mod password_reset_repo;
pub mod plan_repo;
pub mod product_repo;
pub mod subscription_repo;
pub mod tenant_repo;

pub use admin_repo::AdminRepository;
pub use customer_repo::CustomerRepository;
pub use dashboard_repo::DashboardRepository;
pub use onboarding_repo::OnboardingRepository;
pub use password_reset_repo::PasswordResetRepository;
pub use plan_repo::PlanRepository;
pub use product_repo::ProductRepository;
pub use subscription_repo::SubscriptionRepository;
pub use tenant_repo::TenantRepository;
