// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Spaces ---
        handlers::spaces::create_space,
        handlers::spaces::list_my_spaces,
        handlers::spaces::add_member,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::update_lead,
        handlers::leads::move_lead_stage,
        handlers::leads::delete_lead,

        // --- Clients ---
        handlers::clients::list_clients,
        handlers::clients::create_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::clients::upsert_nps,
        handlers::clients::delete_nps,

        // --- Objectives ---
        handlers::objectives::list_objectives,
        handlers::objectives::get_stats,
        handlers::objectives::get_progress,
        handlers::objectives::create_objective,
        handlers::objectives::update_objective,
        handlers::objectives::delete_objective,
        handlers::objectives::upsert_progress_log,
        handlers::objectives::delete_progress_log,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Spaces ---
            models::space::Space,
            handlers::spaces::CreateSpacePayload,
            handlers::spaces::AddMemberPayload,

            // --- Leads ---
            models::lead::LeadStage,
            models::lead::LeadTemperature,
            models::lead::Lead,
            handlers::leads::CreateLeadPayload,
            handlers::leads::UpdateLeadPayload,
            handlers::leads::MoveStagePayload,

            // --- Clients ---
            models::client::ClientStatus,
            models::client::NpsRecord,
            models::client::Client,
            models::client::ClientView,
            handlers::clients::CreateClientPayload,
            handlers::clients::UpdateClientPayload,
            handlers::clients::NpsPayload,

            // --- Objectives ---
            models::objective::ValueType,
            models::objective::ObjectiveStatus,
            models::objective::DataSource,
            models::objective::ProgressLog,
            models::objective::Objective,
            models::objective::MonthCell,
            models::objective::ObjectiveStats,
            models::objective::ObjectiveProgress,
            handlers::objectives::CreateObjectivePayload,
            handlers::objectives::UpdateObjectivePayload,
            handlers::objectives::ProgressLogPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Spaces", description = "Espaços de trabalho e membros"),
        (name = "Leads", description = "Funil comercial (kanban)"),
        (name = "Clients", description = "Carteira de clientes e NPS"),
        (name = "Objectives", description = "Objetivos estratégicos e progresso mensal")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
