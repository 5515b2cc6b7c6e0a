// src/handlers/spaces.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, space::SpaceContext},
    models::space::Space,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSpacePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Agência Norte")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddMemberPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "bruno@empresa.com")]
    pub email: String,
}

// POST /api/spaces
#[utoipa::path(
    post,
    path = "/api/spaces",
    tag = "Spaces",
    request_body = CreateSpacePayload,
    responses(
        (status = 201, description = "Space criado (o criador vira membro)", body = Space),
        (status = 409, description = "Já existe um space com esse nome")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_space(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSpacePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let space = app_state
        .space_service
        .create_space_with_owner(payload.name.trim(), payload.description.as_deref(), user.0.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(space)))
}

// GET /api/spaces
#[utoipa::path(
    get,
    path = "/api/spaces",
    tag = "Spaces",
    responses(
        (status = 200, description = "Spaces dos quais o usuário é membro", body = Vec<Space>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_spaces(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let spaces = app_state
        .space_service
        .list_my_spaces(user.0.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(spaces)))
}

// POST /api/spaces/members
#[utoipa::path(
    post,
    path = "/api/spaces/members",
    tag = "Spaces",
    request_body = AddMemberPayload,
    responses(
        (status = 204, description = "Membro adicionado"),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Usuário já é membro")
    ),
    params(
        ("x-space-id" = Uuid, Header, description = "ID do space")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    locale: Locale,
    space: SpaceContext,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .space_service
        .add_member_by_email(space.0, &payload.email)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
