// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use microempresa_backend::{
    config::{AppState, Settings},
    router::build_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let (Some(email), Some(password)) = (&app_state.settings.admin_email, &app_state.settings.admin_password) {
        if let Some(admin) = app_state.admin_service.ensure_bootstrap(email, password).await? {
            tracing::info!(admin_id = %admin.id, "👤 Super usuário inicial criado a partir do ambiente");
        }
    }

    let addr = app_state.settings.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
