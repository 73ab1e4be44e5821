// src/models.rs

pub mod admin;
pub mod auth;
pub mod customer;
pub mod dashboard;
pub mod onboarding;
pub mod password_reset;
pub mod plan;
pub mod product;
pub mod subscription;
pub mod tenant;
