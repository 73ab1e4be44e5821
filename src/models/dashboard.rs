// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    subscription::Subscription,
    tenant::{StoreKind, TenantProfile},
};

/// Resumo por papel; `role` indica qual variante veio.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "role")]
pub enum DashboardSummary {
    #[serde(rename = "super_usuario")]
    SuperAdmin(AdminDashboard),
    #[serde(rename = "microempresa")]
    Tenant(TenantDashboard),
    #[serde(rename = "cliente")]
    Customer(CustomerDashboard),
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AdminDashboard {
    pub tenants_total: i64,
    pub tenants_active: i64,
    pub tenants_pending: i64,
    pub customers_total: i64,
    pub admins_total: i64,
    pub pending_reviews: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantDashboard {
    pub tenant: TenantProfile,
    pub products_total: i64,
    pub products_low_stock: i64,
    pub customers_total: i64,
    /// Assinaturas da microempresa, a mais recente primeiro.
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerDashboard {
    pub tenants: Vec<StoreSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreSummary {
    pub id: Uuid,
    pub business_name: String,
    pub logo_url: Option<String>,
    pub address: String,
    pub schedule: String,
    pub store_kind: StoreKind,
}
