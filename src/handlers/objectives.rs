// src/handlers/objectives.rs

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
        validation::{validate_not_negative, validate_positive},
    },
    config::AppState,
    middleware::{i18n::Locale, space::SpaceContext},
    models::objective::{
        DataSource, NewObjective, Objective, ObjectiveChanges, ObjectiveProgress, ObjectiveStats, ValueType,
    },
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateObjectivePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Faturamento anual")]
    pub name: String,
    pub description: Option<String>,

    pub value_type: ValueType,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "500000.00")]
    pub target_value: Decimal,

    #[schema(example = "2025-12-31")]
    pub deadline: NaiveDate,

    #[serde(default)]
    pub is_commercial: bool,

    #[serde(default)]
    #[schema(example = json!(["crm", "clients"]))]
    pub data_sources: Vec<DataSource>,
}

impl From<CreateObjectivePayload> for NewObjective {
    fn from(p: CreateObjectivePayload) -> Self {
        NewObjective {
            name: p.name.trim().to_string(),
            description: p.description,
            value_type: p.value_type,
            target_value: p.target_value,
            deadline: p.deadline,
            is_commercial: p.is_commercial,
            data_sources: p.data_sources,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateObjectivePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    // Ausente mantém, `null` limpa
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub value_type: Option<ValueType>,
    #[validate(custom(function = "validate_positive"))]
    pub target_value: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
    pub is_commercial: Option<bool>,
    pub data_sources: Option<Vec<DataSource>>,
}

impl From<UpdateObjectivePayload> for ObjectiveChanges {
    fn from(p: UpdateObjectivePayload) -> Self {
        ObjectiveChanges {
            name: p.name,
            description: p.description,
            value_type: p.value_type,
            target_value: p.target_value,
            deadline: p.deadline,
            is_commercial: p.is_commercial,
            data_sources: p.data_sources,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLogPayload {
    #[validate(range(min = 1, max = 12, message = "invalid_month"))]
    #[schema(example = 4)]
    pub month: i32,
    #[validate(range(min = 2000, max = 2100, message = "invalid_year"))]
    #[schema(example = 2025)]
    pub year: i32,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "120.0")]
    pub value: Decimal,
    pub description: Option<String>,
}

// =============================================================================
//  LEITURA
// =============================================================================

// GET /api/objectives
#[utoipa::path(
    get,
    path = "/api/objectives",
    tag = "Objectives",
    responses(
        (status = 200, description = "Objetivos com valor atual e status recalculados", body = Vec<Objective>)
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_objectives(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
) -> Result<impl IntoResponse, ApiError> {
    let objectives = app_state
        .objective_service
        .list_objectives(space.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(objectives)))
}

// GET /api/objectives/stats
#[utoipa::path(
    get,
    path = "/api/objectives/stats",
    tag = "Objectives",
    responses(
        (status = 200, description = "Contagem por status", body = ObjectiveStats)
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .objective_service
        .get_stats(space.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/objectives/{id}/progress
#[utoipa::path(
    get,
    path = "/api/objectives/{id}/progress",
    tag = "Objectives",
    responses(
        (status = 200, description = "Percentual e grade mensal", body = ObjectiveProgress),
        (status = 404, description = "Objetivo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do objetivo"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = app_state
        .objective_service
        .get_progress(space.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(progress)))
}

// =============================================================================
//  CONFIGURAÇÃO
// =============================================================================

// POST /api/objectives
#[utoipa::path(
    post,
    path = "/api/objectives",
    tag = "Objectives",
    request_body = CreateObjectivePayload,
    responses(
        (status = 201, description = "Objetivo criado", body = Objective),
        (status = 400, description = "Configuração inválida")
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_objective(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Json(payload): Json<CreateObjectivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let objective = app_state
        .objective_service
        .add_objective(space.0, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(objective)))
}

// PUT /api/objectives/{id}
#[utoipa::path(
    put,
    path = "/api/objectives/{id}",
    tag = "Objectives",
    request_body = UpdateObjectivePayload,
    responses(
        (status = 200, description = "Objetivo atualizado", body = Objective),
        (status = 400, description = "Configuração inválida"),
        (status = 404, description = "Objetivo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do objetivo"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_objective(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateObjectivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let objective = app_state
        .objective_service
        .update_objective(space.0, id, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(objective)))
}

// DELETE /api/objectives/{id}
#[utoipa::path(
    delete,
    path = "/api/objectives/{id}",
    tag = "Objectives",
    responses(
        (status = 204, description = "Objetivo removido (com os logs)"),
        (status = 404, description = "Objetivo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do objetivo"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_objective(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .objective_service
        .delete_objective(space.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  LOGS MENSAIS
// =============================================================================

// PUT /api/objectives/{id}/logs
#[utoipa::path(
    put,
    path = "/api/objectives/{id}/logs",
    tag = "Objectives",
    request_body = ProgressLogPayload,
    responses(
        (status = 200, description = "Log do mês gravado (substitui o anterior)", body = Objective),
        (status = 400, description = "Objetivo comercial ou dados inválidos"),
        (status = 404, description = "Objetivo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do objetivo"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_progress_log(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressLogPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let objective = app_state
        .objective_service
        .add_progress_log(
            space.0,
            id,
            payload.month,
            payload.year,
            payload.value,
            payload.description.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(objective)))
}

// DELETE /api/objectives/{id}/logs/{year}/{month}
#[utoipa::path(
    delete,
    path = "/api/objectives/{id}/logs/{year}/{month}",
    tag = "Objectives",
    responses(
        (status = 200, description = "Log removido e objetivo recalculado", body = Objective),
        (status = 400, description = "Objetivo comercial não tem logs"),
        (status = 404, description = "Objetivo ou log não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do objetivo"),
        ("year" = i32, Path, description = "Ano"),
        ("month" = i32, Path, description = "Mês (1-12)"),
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_progress_log(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Path((id, year, month)): Path<(Uuid, i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let objective = app_state
        .objective_service
        .delete_progress_log(space.0, id, month, year)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(objective)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_defaults_to_manual() {
        let payload: CreateObjectivePayload = serde_json::from_str(
            r#"{ "name": "Novos contratos", "valueType": "quantity", "targetValue": 12, "deadline": "2025-12-31" }"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());

        let objective: NewObjective = payload.into();
        assert!(!objective.is_commercial);
        assert!(objective.data_sources.is_empty());
    }

    #[test]
    fn zero_target_fails_payload_validation() {
        let payload: CreateObjectivePayload = serde_json::from_str(
            r#"{ "name": "X", "valueType": "financial", "targetValue": 0, "deadline": "2025-12-31",
                 "isCommercial": true, "dataSources": ["crm"] }"#,
        )
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("target_value"));
    }

    #[test]
    fn log_payload_rejects_month_out_of_range() {
        let payload: ProgressLogPayload =
            serde_json::from_str(r#"{ "month": 0, "year": 2025, "value": 3 }"#).unwrap();
        assert!(payload.validate().unwrap_err().field_errors().contains_key("month"));
    }

    #[test]
    fn update_payload_null_clears_description() {
        let payload: UpdateObjectivePayload = serde_json::from_str(r#"{ "description": null }"#).unwrap();
        let changes: ObjectiveChanges = payload.into();
        assert_eq!(changes.description, Some(None));
        assert!(changes.name.is_none());

        let payload: UpdateObjectivePayload = serde_json::from_str(r#"{ "name": "Renovações" }"#).unwrap();
        let changes: ObjectiveChanges = payload.into();
        assert_eq!(changes.description, None);
    }
}
