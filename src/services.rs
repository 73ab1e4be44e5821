// src/services.rs

pub mod admin_service;
pub mod auth;
pub mod authorization;
pub mod customer_service;
pub mod dashboard_service;
pub mod identity;
pub mod mail_service;
pub mod onboarding_service;
pub mod password_reset_service;
pub mod plan_service;
pub mod product_service;
pub mod security;
pub mod storage_service;
pub mod tenant_service;
