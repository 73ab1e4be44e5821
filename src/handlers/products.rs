// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::CurrentSession, i18n::Locale},
    models::product::{Product, ProductFilter},
};

// GET /api/productos
#[utoipa::path(
    get,
    path = "/api/productos",
    tag = "Productos",
    params(ProductFilter),
    responses(
        (status = 200, description = "Catálogo visível para a sessão", body = Vec<Product>),
        (status = 403, description = "Clientes não acessam o catálogo interno")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_service
        .list(session.actor().as_ref(), filter.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(products)))
}

// GET /api/productos/{id}
#[utoipa::path(
    get,
    path = "/api/productos/{id}",
    tag = "Productos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 403, description = "Produto de outra microempresa"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .get(session.actor().as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(product)))
}
