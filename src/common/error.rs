// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Erro da camada de serviço. Cada variante tem um "código" estável que é
// traduzido para o idioma do usuário na hora de virar resposta HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Configuração de objetivo inválida: {0}")]
    InvalidObjectiveConfig(&'static str),

    #[error("Objetivo comercial não aceita log manual")]
    CommercialObjectiveLog,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cabeçalho x-space-id ausente")]
    MissingSpaceHeader,

    #[error("Cabeçalho x-space-id inválido")]
    InvalidSpaceHeader,

    #[error("Sem acesso ao space")]
    SpaceAccessDenied,

    #[error("Já existe um space com o nome '{0}'")]
    SpaceNameAlreadyExists(String),

    #[error("Usuário já é membro do space")]
    AlreadySpaceMember,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Objetivo não encontrado")]
    ObjectiveNotFound,

    #[error("Log de progresso não encontrado")]
    ProgressLogNotFound,

    #[error("Registro de NPS não encontrado")]
    NpsRecordNotFound,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::InvalidObjectiveConfig(code) => *code,
            AppError::CommercialObjectiveLog => "commercial_objective_log",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::MissingSpaceHeader => "missing_space_header",
            AppError::InvalidSpaceHeader => "invalid_space_header",
            AppError::SpaceAccessDenied => "space_access_denied",
            AppError::SpaceNameAlreadyExists(_) => "space_name_already_exists",
            AppError::AlreadySpaceMember => "already_space_member",
            AppError::LeadNotFound => "lead_not_found",
            AppError::ClientNotFound => "client_not_found",
            AppError::ObjectiveNotFound => "objective_not_found",
            AppError::ProgressLogNotFound => "progress_log_not_found",
            AppError::NpsRecordNotFound => "nps_record_not_found",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidObjectiveConfig(_)
            | AppError::CommercialObjectiveLog
            | AppError::MissingSpaceHeader
            | AppError::InvalidSpaceHeader => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists
            | AppError::SpaceNameAlreadyExists(_)
            | AppError::AlreadySpaceMember => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::SpaceAccessDenied => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::LeadNotFound
            | AppError::ClientNotFound
            | AppError::ObjectiveNotFound
            | AppError::ProgressLogNotFound
            | AppError::NpsRecordNotFound => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para a resposta HTTP, já traduzida.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe vai para o log, nunca para o cliente
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(store.translate(&locale.0, code))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            AppError::SpaceNameAlreadyExists(name) => Some(json!({ "name": name })),
            _ => None,
        };

        ApiError {
            status,
            error: store.translate(&locale.0, self.code()),
            details,
        }
    }
}

// A rejeição HTTP de fato (o que o frontend recebe)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// ---
// Catálogo de mensagens (código -> texto) por idioma
// ---
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

const FALLBACK_LANG: &str = "en";

const PT: &[(&str, &str)] = &[
    ("validation_failed", "Um ou mais campos são inválidos."),
    ("required", "Campo obrigatório."),
    ("invalid_email", "E-mail inválido."),
    ("password_too_short", "A senha deve ter no mínimo 6 caracteres."),
    ("invalid_month", "O mês deve estar entre 1 e 12."),
    ("invalid_year", "Ano inválido."),
    ("invalid_score", "A nota de NPS deve estar entre 0 e 10."),
    ("value_not_negative", "O valor não pode ser negativo."),
    ("target_must_be_positive", "A meta deve ser maior que zero."),
    ("commercial_requires_sources", "Objetivos comerciais precisam de ao menos uma fonte de dados."),
    ("manual_objective_has_sources", "Objetivos manuais não têm fontes de dados."),
    ("percentage_not_commercial", "Objetivos percentuais não podem ser comerciais."),
    ("commercial_objective_log", "Objetivos comerciais são calculados automaticamente; não aceitam log manual."),
    ("email_already_exists", "Este e-mail já está em uso."),
    ("invalid_credentials", "E-mail ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("user_not_found", "Usuário não encontrado."),
    ("missing_space_header", "O cabeçalho x-space-id é obrigatório."),
    ("invalid_space_header", "Cabeçalho x-space-id inválido (não é um UUID)."),
    ("space_access_denied", "Você não tem acesso a este space."),
    ("space_name_already_exists", "Você já tem um space com esse nome."),
    ("already_space_member", "Este usuário já é membro do space."),
    ("lead_not_found", "Lead não encontrado."),
    ("client_not_found", "Cliente não encontrado."),
    ("objective_not_found", "Objetivo não encontrado."),
    ("progress_log_not_found", "Log de progresso não encontrado."),
    ("nps_record_not_found", "Registro de NPS não encontrado."),
    ("internal_error", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("validation_failed", "One or more fields are invalid."),
    ("required", "This field is required."),
    ("invalid_email", "Invalid e-mail."),
    ("password_too_short", "Password must have at least 6 characters."),
    ("invalid_month", "Month must be between 1 and 12."),
    ("invalid_year", "Invalid year."),
    ("invalid_score", "NPS score must be between 0 and 10."),
    ("value_not_negative", "Value cannot be negative."),
    ("target_must_be_positive", "Target value must be greater than zero."),
    ("commercial_requires_sources", "Commercial objectives need at least one data source."),
    ("manual_objective_has_sources", "Manual objectives cannot have data sources."),
    ("percentage_not_commercial", "Percentage objectives cannot be commercial."),
    ("commercial_objective_log", "Commercial objectives are computed automatically and do not accept manual logs."),
    ("email_already_exists", "This e-mail is already in use."),
    ("invalid_credentials", "Invalid e-mail or password."),
    ("invalid_token", "Invalid or missing authentication token."),
    ("user_not_found", "User not found."),
    ("missing_space_header", "The x-space-id header is required."),
    ("invalid_space_header", "Invalid x-space-id header (not a UUID)."),
    ("space_access_denied", "You do not have access to this space."),
    ("space_name_already_exists", "You already have a space with this name."),
    ("already_space_member", "This user is already a member of the space."),
    ("lead_not_found", "Lead not found."),
    ("client_not_found", "Client not found."),
    ("objective_not_found", "Objective not found."),
    ("progress_log_not_found", "Progress log not found."),
    ("nps_record_not_found", "NPS record not found."),
    ("internal_error", "An unexpected error occurred."),
];

impl Default for I18nStore {
    fn default() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("pt", PT.iter().copied().collect());
        catalogs.insert("en", EN.iter().copied().collect());
        Self { catalogs }
    }
}

impl I18nStore {
    /// Idioma pedido -> inglês -> o próprio código.
    pub fn translate(&self, lang: &str, code: &str) -> String {
        [lang, FALLBACK_LANG]
            .iter()
            .find_map(|l| self.catalogs.get(l).and_then(|c| c.get(code)))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn translation_falls_back_to_english_then_code() {
        let store = I18nStore::default();
        assert_eq!(store.translate("pt", "lead_not_found"), "Lead não encontrado.");
        assert_eq!(store.translate("fr", "lead_not_found"), "Lead not found.");
        assert_eq!(store.translate("pt", "no_such_code"), "no_such_code");
    }

    #[test]
    fn every_code_has_both_translations() {
        let store = I18nStore::default();
        for (code, _) in PT {
            assert!(store.catalogs["en"].contains_key(code), "faltando em en: {code}");
        }
        assert_eq!(PT.len(), EN.len());
    }

    #[test]
    fn not_found_and_config_errors_map_to_client_statuses() {
        let store = I18nStore::default();

        let err = AppError::ObjectiveNotFound.to_api_error(&pt(), &store);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error, "Objetivo não encontrado.");

        let err = AppError::InvalidObjectiveConfig("percentage_not_commercial").to_api_error(&pt(), &store);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "Objetivos percentuais não podem ser comerciais.");

        assert_eq!(AppError::SpaceAccessDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::EmailAlreadyExists.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_errors_are_masked() {
        let store = I18nStore::default();
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: hunter2"))
            .to_api_error(&Locale("en".into()), &store);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error, "An unexpected error occurred.");
        assert!(err.details.is_none());
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(range(min = 1, max = 12, message = "invalid_month"))]
        month: i32,
    }

    #[test]
    fn validation_details_are_translated_per_field() {
        let store = I18nStore::default();
        let errors = Probe { month: 13 }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["month"][0], "O mês deve estar entre 1 e 12.");
    }
}
