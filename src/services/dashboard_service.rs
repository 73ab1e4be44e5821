// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::{DashboardRepository, SubscriptionRepository, TenantRepository},
    models::{
        auth::Principal,
        dashboard::{CustomerDashboard, DashboardSummary, StoreSummary, TenantDashboard},
        tenant::Tenant,
    },
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    tenant_repo: TenantRepository,
    subscription_repo: SubscriptionRepository,
}

impl DashboardService {
    pub fn new(
        repo: DashboardRepository,
        tenant_repo: TenantRepository,
        subscription_repo: SubscriptionRepository,
    ) -> Self {
        Self { repo, tenant_repo, subscription_repo }
    }

    /// Resumo de acordo com o papel ativo da sessão.
    pub async fn summary(&self, principal: &Principal) -> Result<DashboardSummary, AppError> {
        match principal {
            Principal::Admin(_) => Ok(DashboardSummary::SuperAdmin(self.repo.admin_summary().await?)),

            Principal::Tenant(tenant) => {
                let (products_total, products_low_stock, customers_total) =
                    self.repo.tenant_counts(tenant.id).await?;
                let subscriptions = self.subscription_repo.list_for_tenant(tenant.id).await?;
                Ok(DashboardSummary::Tenant(TenantDashboard {
                    tenant: tenant.clone().into(),
                    products_total,
                    products_low_stock,
                    customers_total,
                    subscriptions,
                }))
            }

            Principal::Customer(_) => {
                let tenants = self.tenant_repo.list_active().await?;
                Ok(DashboardSummary::Customer(CustomerDashboard {
                    tenants: tenants.into_iter().map(store_summary).collect(),
                }))
            }
        }
    }
}

fn store_summary(tenant: Tenant) -> StoreSummary {
    let store_kind = tenant.store_kind();
    StoreSummary {
        id: tenant.id,
        business_name: tenant.business_name,
        logo_url: tenant.logo_url,
        address: tenant.address,
        schedule: tenant.schedule,
        store_kind,
    }
}
