// src/middleware/space.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

// O nome do nosso cabeçalho HTTP customizado
pub const SPACE_ID_HEADER: &str = "x-space-id";

// O space em que a requisição opera (já conferido contra a membership)
#[derive(Debug, Clone, Copy)]
pub struct SpaceContext(pub Uuid);

pub fn space_id_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers.get(SPACE_ID_HEADER).ok_or(AppError::MissingSpaceHeader)?;
    let value_str = value.to_str().map_err(|_| AppError::InvalidSpaceHeader)?;
    Uuid::parse_str(value_str.trim()).map_err(|_| AppError::InvalidSpaceHeader)
}

// Roda DEPOIS do auth_guard: precisa do usuário nos extensions
pub async fn space_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let space_id = space_id_from_headers(request.headers()).map_err(to_api)?;

    let is_member = app_state
        .space_service
        .is_member(user.id, space_id)
        .await
        .map_err(to_api)?;

    if !is_member {
        tracing::warn!("Usuário {} tentou acessar o space {}", user.id, space_id);
        return Err(to_api(AppError::SpaceAccessDenied));
    }

    request.extensions_mut().insert(SpaceContext(space_id));
    Ok(next.run(request).await)
}

impl FromRequestParts<AppState> for SpaceContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<SpaceContext>() {
            return Ok(*ctx);
        }

        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        Err(AppError::MissingSpaceHeader.to_api_error(&locale, &state.i18n_store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_is_parsed_as_uuid() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(SPACE_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        assert_eq!(space_id_from_headers(&headers).unwrap(), id);
    }

    #[test]
    fn missing_or_garbage_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(space_id_from_headers(&headers), Err(AppError::MissingSpaceHeader)));

        let mut headers = HeaderMap::new();
        headers.insert(SPACE_ID_HEADER, HeaderValue::from_static("loja-1"));
        assert!(matches!(space_id_from_headers(&headers), Err(AppError::InvalidSpaceHeader)));
    }
}
