//src/main.rs

use axum::{
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use business_metrics::{
    config::{AppConfig, AppState},
    docs::ApiDoc,
    handlers,
    scheduler::{register_recalculation_jobs, RecalculationServices, Scheduler},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Configuração inválida impede a aplicação de subir.
    let config = AppConfig::from_env()?;
    let app_state = AppState::new(config).await?;
    let schedule = &app_state.config.schedule;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // --- Jobs de recálculo ---
    let scheduler_handle = if schedule.enabled {
        let mut scheduler = Scheduler::new();
        register_recalculation_jobs(
            &mut scheduler,
            RecalculationServices {
                inventory: app_state.inventory_metrics_service.clone(),
                client_category: app_state.client_category_service.clone(),
                satisfaction: app_state.satisfaction_service.clone(),
            },
            schedule,
        );
        let handle = scheduler.start();
        tracing::info!(jobs = handle.job_count(), "⏱️ Agendador iniciado");
        Some(handle)
    } else {
        tracing::warn!("Agendador desabilitado (SCHEDULER_ENABLED=false)");
        None
    };

    let report_routes = Router::new()
        .route("/sales-overview", get(handlers::reports::get_sales_overview))
        .route("/inventory-overview", get(handlers::reports::get_inventory_overview))
        .route("/clients-overview", get(handlers::reports::get_clients_overview))
        .route(
            "/inventory-stats/recalculate",
            post(handlers::reports::recalculate_inventory_stats),
        );

    let listener = TcpListener::bind((app_state.config.host.as_str(), app_state.config.port)).await?;

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/reports", report_routes)
        .with_state(app_state);

    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler_handle {
        handle.shutdown();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de desligamento: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Sinal de desligamento recebido");
}
