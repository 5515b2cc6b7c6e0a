// src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState};
use crate::db::LeadRepository;
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, space::space_guard};
use crate::services::stage_automation::StageAutomation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env().context("Falha ao ler a configuração")?;
    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // --- Tarefas de fundo ---
    StageAutomation::new(
        LeadRepository::new(app_state.db_pool.clone()),
        app_state.events.clone(),
        app_state.config.stage_threshold_hours,
        app_state.config.stage_poll_interval,
    )
    .spawn();
    app_state.objective_service.spawn_snapshot_refresher();

    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas só com usuário (sem space)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let space_routes = Router::new()
        .route(
            "/",
            post(handlers::spaces::create_space).get(handlers::spaces::list_my_spaces),
        )
        .merge(
            Router::new()
                .route("/members", post(handlers::spaces::add_member))
                .layer(axum_middleware::from_fn_with_state(app_state.clone(), space_guard)),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let lead_routes = Router::new()
        .route(
            "/",
            get(handlers::leads::list_leads).post(handlers::leads::create_lead),
        )
        .route(
            "/{id}",
            put(handlers::leads::update_lead).delete(handlers::leads::delete_lead),
        )
        .route("/{id}/stage", patch(handlers::leads::move_lead_stage));

    let client_routes = Router::new()
        .route(
            "/",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/{id}",
            put(handlers::clients::update_client).delete(handlers::clients::delete_client),
        )
        .route("/{id}/nps", put(handlers::clients::upsert_nps))
        .route("/{id}/nps/{year}/{month}", delete(handlers::clients::delete_nps));

    let objective_routes = Router::new()
        .route(
            "/",
            get(handlers::objectives::list_objectives).post(handlers::objectives::create_objective),
        )
        .route("/stats", get(handlers::objectives::get_stats))
        .route(
            "/{id}",
            put(handlers::objectives::update_objective).delete(handlers::objectives::delete_objective),
        )
        .route("/{id}/progress", get(handlers::objectives::get_progress))
        .route("/{id}/logs", put(handlers::objectives::upsert_progress_log))
        .route(
            "/{id}/logs/{year}/{month}",
            delete(handlers::objectives::delete_progress_log),
        );

    // Tudo que é do space: auth_guard (de fora) roda antes do space_guard
    let scoped_routes = Router::new()
        .nest("/leads", lead_routes)
        .nest("/clients", client_routes)
        .nest("/objectives", objective_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), space_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/spaces", space_routes)
        .nest("/api", scoped_routes)
        .with_state(app_state.clone());

    // Inicia o servidor
    let listener = TcpListener::bind(&app_state.config.server_addr)
        .await
        .with_context(|| format!("Falha ao escutar em {}", app_state.config.server_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
