// src/handlers/leads.rs

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
    models::lead::{Lead, LeadChanges, LeadStage, LeadTemperature, NewLead},
};

fn default_temperature() -> LeadTemperature {
    LeadTemperature::Warm
}

fn default_stage() -> LeadStage {
    LeadStage::New
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "João Pereira")]
    pub name: String,
    pub company: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(example = "15000.00")]
    pub value: Decimal,

    #[serde(default = "default_temperature")]
    pub temperature: LeadTemperature,
    // Criar direto numa coluna do kanban
    #[serde(default = "default_stage")]
    pub stage: LeadStage,

    pub last_contact: Option<NaiveDate>,
    pub origin: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateLeadPayload> for NewLead {
    fn from(p: CreateLeadPayload) -> Self {
        NewLead {
            name: p.name.trim().to_string(),
            company: p.company,
            email: p.email,
            phone: p.phone,
            value: p.value,
            temperature: p.temperature,
            stage: p.stage,
            last_contact: p.last_contact,
            origin: p.origin,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,

    // Ausente mantém, `null` limpa
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub company: Option<Option<String>>,
    #[validate(email(message = "invalid_email"))]
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,

    #[validate(custom(function = "validate_not_negative"))]
    pub value: Option<Decimal>,
    pub temperature: Option<LeadTemperature>,
    pub stage: Option<LeadStage>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub last_contact: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub origin: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl From<UpdateLeadPayload> for LeadChanges {
    fn from(p: UpdateLeadPayload) -> Self {
        LeadChanges {
            name: p.name,
            company: p.company,
            email: p.email,
            phone: p.phone,
            value: p.value,
            temperature: p.temperature,
            stage: p.stage,
            last_contact: p.last_contact,
            origin: p.origin,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveStagePayload {
    #[schema(example = "proposal")]
    pub stage: LeadStage,
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    responses(
        (status = 200, description = "Leads do space", body = Vec<Lead>)
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .lead_service
        .list_leads(space.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(leads)))
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .create_lead(space.0, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// PUT /api/leads/{id}
#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    tag = "Leads",
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .update_lead(space.0, id, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// PATCH /api/leads/{id}/stage
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/stage",
    tag = "Leads",
    request_body = MoveStagePayload,
    responses(
        (status = 200, description = "Lead movido de coluna", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_lead_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveStagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .move_lead(space.0, id, payload.stage)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    responses(
        (status = 204, description = "Lead removido"),
        (status = 404, description = "Lead não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete_lead(space.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_fills_kanban_defaults() {
        let payload: CreateLeadPayload = serde_json::from_str(r#"{ "name": "Maria" }"#).unwrap();
        assert!(payload.validate().is_ok());

        let lead: NewLead = payload.into();
        assert_eq!(lead.stage, LeadStage::New);
        assert_eq!(lead.temperature, LeadTemperature::Warm);
        assert_eq!(lead.value, Decimal::ZERO);
    }

    #[test]
    fn negative_value_and_bad_email_are_rejected() {
        let payload: CreateLeadPayload =
            serde_json::from_str(r#"{ "name": "Maria", "value": -5, "email": "nao-e-email" }"#).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("value"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn update_payload_accepts_partial_body() {
        let payload: UpdateLeadPayload =
            serde_json::from_str(r#"{ "stage": "negotiation", "lastContact": "2025-03-10" }"#).unwrap();
        assert!(payload.validate().is_ok());

        let changes: LeadChanges = payload.into();
        assert_eq!(changes.stage, Some(LeadStage::Negotiation));
        assert!(changes.name.is_none());
        assert_eq!(changes.last_contact, Some(NaiveDate::from_ymd_opt(2025, 3, 10)));
        assert_eq!(changes.notes, None);
    }

    #[test]
    fn update_payload_null_clears_field() {
        let payload: UpdateLeadPayload =
            serde_json::from_str(r#"{ "notes": null, "company": null }"#).unwrap();
        assert!(payload.validate().is_ok());

        let changes: LeadChanges = payload.into();
        assert_eq!(changes.notes, Some(None));
        assert_eq!(changes.company, Some(None));
        assert_eq!(changes.origin, None);
    }
}
