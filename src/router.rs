// src/router.rs

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Origem CORS inválida ignorada");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT_LANGUAGE])
        .allow_credentials(true)
}

/// Monta todas as rotas. Grupos autenticados passam pelo `auth_guard`.
pub fn build_router(app_state: AppState) -> Router {
    let guard = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Rotas públicas de sessão e recuperação de senha
    let auth_routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/guest-login", post(handlers::auth::guest_login))
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/me", get(handlers::auth::me))
        .route("/api/password-reset/request", post(handlers::password_reset::request_reset))
        .route("/api/password/forgot", post(handlers::password_reset::request_reset))
        .route("/api/password-reset/confirm", post(handlers::password_reset::confirm_reset))
        .route("/api/password/reset", post(handlers::password_reset::confirm_reset));

    let session_routes = Router::new()
        .route("/api/switch-role", post(handlers::auth::switch_role))
        .route("/api/dashboard", get(handlers::dashboard::get_summary))
        .layer(guard());

    // Cadastro público + fila de revisão do super usuário
    let signup_routes = Router::new()
        .route("/start", post(handlers::onboarding::start))
        .route("/select-plan", post(handlers::onboarding::select_plan))
        .route("/submit", post(handlers::onboarding::submit))
        .route("/status", get(handlers::onboarding::status))
        .route("/qr", get(handlers::onboarding::qr));

    let review_routes = Router::new()
        .route("/pending", get(handlers::onboarding::list_pending))
        .route("/proof/{signup_id}", get(handlers::onboarding::download_proof))
        .route("/{tenant_id}/approve", patch(handlers::onboarding::approve))
        .route("/{tenant_id}/reject", patch(handlers::onboarding::reject))
        .layer(guard());

    let plan_admin_routes = Router::new()
        .route("/", get(handlers::plans::list_all_plans).post(handlers::plans::create_plan))
        .route("/{id}", patch(handlers::plans::update_plan).delete(handlers::plans::delete_plan))
        .layer(guard());

    let admin_routes = Router::new()
        .route("/", get(handlers::admins::list_admins).post(handlers::admins::create_admin))
        .route("/{id}", put(handlers::admins::update_admin).delete(handlers::admins::delete_admin))
        .route("/{id}/activate", patch(handlers::admins::activate_admin))
        .layer(guard());

    let tenant_routes = Router::new()
        .route("/", get(handlers::tenants::list_tenants).post(handlers::tenants::create_tenant))
        .route(
            "/{id}",
            get(handlers::tenants::get_tenant)
                .put(handlers::tenants::update_tenant)
                .delete(handlers::tenants::delete_tenant),
        )
        .route("/{id}/deactivate", patch(handlers::tenants::deactivate_tenant))
        .route("/{id}/activate", patch(handlers::tenants::activate_tenant))
        .layer(guard());

    let customer_routes = Router::new()
        .route("/", get(handlers::customers::list_customers).post(handlers::customers::create_customer))
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route("/{id}/deactivate", patch(handlers::customers::deactivate_customer))
        .route("/{id}/activate", patch(handlers::customers::activate_customer))
        .layer(guard());

    let product_routes = Router::new()
        .route("/", get(handlers::products::list_products))
        .route("/{id}", get(handlers::products::get_product))
        .layer(guard());

    let cors = cors_layer(&app_state.settings.frontend_origins);
    let body_limit = DefaultBodyLimit::max(app_state.settings.max_content_length);

    Router::new()
        .route("/api/health", get(handlers::dashboard::health))
        .route("/api/plans", get(handlers::plans::list_public_plans))
        .route("/api/planes", get(handlers::plans::list_legacy_plans))
        .merge(auth_routes)
        .merge(session_routes)
        .nest("/api/onboarding/microempresa", signup_routes.merge(review_routes))
        .nest("/api/admin/plans", plan_admin_routes)
        .nest("/api/admins", admin_routes)
        .nest("/api/microempresas", tenant_routes)
        .nest("/api/clientes", customer_routes)
        .nest("/api/productos", product_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
