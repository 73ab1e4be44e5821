// src/models/plan.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

pub const MAX_FEATURES: usize = 12;
pub const MAX_FEATURE_CHARS: usize = 200;

// Mapeia o CREATE TYPE catalog_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "catalog_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PlanFeature {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub text: String,
    pub position: i32,
}

/// Plano com as características já ordenadas.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanWithFeatures {
    #[serde(flatten)]
    pub plan: Plan,
    pub features: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegacyPlanList {
    pub planes: Vec<PlanWithFeatures>,
}

// --- PAYLOADS ---

/// Lista de características: array de textos ou um texto com uma por linha.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FeaturesInput {
    List(Vec<String>),
    Text(String),
}

impl FeaturesInput {
    pub fn into_items(self) -> Vec<String> {
        match self {
            FeaturesInput::List(items) => items,
            FeaturesInput::Text(text) => text.lines().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlanPayload {
    pub name: Option<String>,
    /// Número ou texto; vazio vale 0.
    #[schema(value_type = Option<f64>)]
    pub price: Option<Value>,
    pub status: Option<CatalogStatus>,
    pub features: Option<FeaturesInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlanPayload {
    pub name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Value>,
    pub status: Option<CatalogStatus>,
    /// Ausente mantém a lista atual; presente substitui por completo.
    pub features: Option<FeaturesInput>,
}

// --- REGRAS ---

/// Remove vazios e aplica os limites de tamanho e quantidade.
pub fn normalize_features(items: Vec<String>) -> Result<Vec<String>, AppError> {
    let features: Vec<String> = items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if features.iter().any(|f| f.chars().count() > MAX_FEATURE_CHARS) {
        return Err(AppError::FeatureTooLong);
    }
    if features.len() > MAX_FEATURES {
        return Err(AppError::TooManyFeatures);
    }
    Ok(features)
}

/// Preço a partir de número ou texto. Vazio/ausente vale 0; negativo é inválido.
pub fn parse_price(raw: Option<&Value>) -> Result<Decimal, AppError> {
    let price = match raw {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(Value::String(s)) if s.trim().is_empty() => Decimal::ZERO,
        Some(Value::String(s)) => Decimal::from_str(s.trim()).map_err(|_| AppError::InvalidPrice)?,
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|_| AppError::InvalidPrice)?,
        Some(_) => return Err(AppError::InvalidPrice),
    };
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::InvalidPrice);
    }
    Ok(price.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_features_are_dropped_and_order_kept() {
        let items = vec![" Soporte ".into(), "".into(), "   ".into(), "Reportes".into()];
        assert_eq!(normalize_features(items).unwrap(), vec!["Soporte", "Reportes"]);
    }

    #[test]
    fn feature_longer_than_200_chars_is_rejected() {
        let items = vec!["x".repeat(201)];
        assert!(matches!(normalize_features(items), Err(AppError::FeatureTooLong)));
        assert!(normalize_features(vec!["á".repeat(200)]).is_ok());
    }

    #[test]
    fn more_than_twelve_features_is_rejected() {
        let items: Vec<String> = (0..13).map(|i| format!("f{i}")).collect();
        assert!(matches!(normalize_features(items), Err(AppError::TooManyFeatures)));
    }

    #[test]
    fn text_input_splits_by_line() {
        let input: FeaturesInput = serde_json::from_value(json!("a\nb\n\nc")).unwrap();
        assert_eq!(normalize_features(input.into_items()).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn price_accepts_numbers_and_text() {
        assert_eq!(parse_price(Some(&json!(99.9))).unwrap(), Decimal::new(9990, 2));
        assert_eq!(parse_price(Some(&json!("50"))).unwrap(), Decimal::new(50, 0));
        assert_eq!(parse_price(Some(&json!(""))).unwrap(), Decimal::ZERO);
        assert_eq!(parse_price(None).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn negative_or_garbage_price_is_rejected() {
        assert!(matches!(parse_price(Some(&json!(-1))), Err(AppError::InvalidPrice)));
        assert!(matches!(parse_price(Some(&json!("abc"))), Err(AppError::InvalidPrice)));
        assert!(matches!(parse_price(Some(&json!([1]))), Err(AppError::InvalidPrice)));
    }
}
