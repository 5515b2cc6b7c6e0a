// src/handlers/clients.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        nullable::double_option,
        validation::validate_not_negative,
    },
    config::AppState,
    middleware::{i18n::Locale, space::SpaceContext},
    models::client::{ClientChanges, ClientStatus, ClientView, NewClient},
};

fn default_status() -> ClientStatus {
    ClientStatus::Active
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Acme Ltda")]
    pub company: String,
    pub contact_name: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,

    // Mensalidade (MRR)
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(example = "2500.00")]
    pub monthly_value: Decimal,

    #[serde(default = "default_status")]
    pub status: ClientStatus,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl From<CreateClientPayload> for NewClient {
    fn from(p: CreateClientPayload) -> Self {
        NewClient {
            company: p.company.trim().to_string(),
            contact_name: p.contact_name,
            email: p.email,
            phone: p.phone,
            monthly_value: p.monthly_value,
            status: p.status,
            start_date: p.start_date,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientPayload {
    #[validate(length(min = 1, message = "required"))]
    pub company: Option<String>,

    // Campos opcionais: ausente mantém, `null` limpa
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub contact_name: Option<Option<String>>,
    #[validate(email(message = "invalid_email"))]
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,

    #[validate(custom(function = "validate_not_negative"))]
    pub monthly_value: Option<Decimal>,
    pub status: Option<ClientStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl From<UpdateClientPayload> for ClientChanges {
    fn from(p: UpdateClientPayload) -> Self {
        ClientChanges {
            company: p.company,
            contact_name: p.contact_name,
            email: p.email,
            phone: p.phone,
            monthly_value: p.monthly_value,
            status: p.status,
            start_date: p.start_date,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NpsPayload {
    #[validate(range(min = 1, max = 12, message = "invalid_month"))]
    #[schema(example = 3)]
    pub month: i32,
    #[validate(range(min = 2000, max = 2100, message = "invalid_year"))]
    #[schema(example = 2025)]
    pub year: i32,
    #[validate(range(min = 0, max = 10, message = "invalid_score"))]
    #[schema(example = 9)]
    pub score: i32,
    pub notes: Option<String>,
}

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    responses(
        (status = 200, description = "Clientes com NPS médio e mais recente", body = Vec<ClientView>)
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .client_service
        .list_clients(space.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = CreateClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = ClientView),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .create_client(space.0, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(client)))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    request_body = UpdateClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = ClientView),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .update_client(space.0, id, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .client_service
        .delete_client(space.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/clients/{id}/nps
#[utoipa::path(
    put,
    path = "/api/clients/{id}/nps",
    tag = "Clients",
    request_body = NpsPayload,
    responses(
        (status = 200, description = "NPS do mês registrado (substitui o anterior)", body = ClientView),
        (status = 400, description = "Mês, ano ou nota fora do intervalo"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_nps(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<NpsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .upsert_nps(space.0, id, payload.month, payload.year, payload.score, payload.notes.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// DELETE /api/clients/{id}/nps/{year}/{month}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}/nps/{year}/{month}",
    tag = "Clients",
    responses(
        (status = 200, description = "NPS removido", body = ClientView),
        (status = 404, description = "Cliente ou registro não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("year" = i32, Path, description = "Ano"),
        ("month" = i32, Path, description = "Mês (1-12)"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_nps(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path((id, year, month)): Path<(Uuid, i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .client_service
        .delete_nps(space.0, id, month, year)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}
