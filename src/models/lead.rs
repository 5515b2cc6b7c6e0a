// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_stage do banco.
// A ordem das variantes é a ordem do funil (kanban).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    New,
    Contact,
    MeetingScheduled,
    MeetingDone,
    Proposal,
    Followup,
    Negotiation,
    Won,
    Lost,
}

impl LeadStage {
    /// Estágios finais do funil: nada sai daqui automaticamente.
    pub fn is_terminal(self) -> bool {
        matches!(self, LeadStage::Won | LeadStage::Lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_temperature", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadTemperature {
    Hot,
    Warm,
    Cold,
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(ignore)]
    pub space_id: Uuid,

    #[schema(example = "João Pereira")]
    pub name: String,
    #[schema(example = "Pereira & Filhos")]
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    #[schema(example = "15000.00")]
    pub value: Decimal,
    pub temperature: LeadTemperature,
    pub stage: LeadStage,

    pub last_contact: Option<NaiveDate>,
    // Atualizado SEMPRE que o estágio muda (edição, arrastar ou automação)
    pub stage_changed_at: DateTime<Utc>,

    #[schema(example = "Indicação")]
    pub origin: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Lead novo (o estágio inicial pode vir do kanban; padrão "new")
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub value: Decimal,
    pub temperature: LeadTemperature,
    pub stage: LeadStage,
    pub last_contact: Option<NaiveDate>,
    pub origin: Option<String>,
    pub notes: Option<String>,
}

// Campos editáveis de um lead (o que vem do formulário).
// Nos opcionais, `Some(None)` limpa o campo.
#[derive(Debug, Clone, Default)]
pub struct LeadChanges {
    pub name: Option<String>,
    pub company: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub value: Option<Decimal>,
    pub temperature: Option<LeadTemperature>,
    pub stage: Option<LeadStage>,
    pub last_contact: Option<Option<NaiveDate>>,
    pub origin: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_follow_pipeline_order() {
        assert!(LeadStage::New < LeadStage::Proposal);
        assert!(LeadStage::Proposal < LeadStage::Followup);
        assert!(LeadStage::Negotiation < LeadStage::Won);
        assert!(LeadStage::Won.is_terminal());
        assert!(LeadStage::Lost.is_terminal());
        assert!(!LeadStage::Followup.is_terminal());
    }

    #[test]
    fn stage_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&LeadStage::MeetingScheduled).unwrap();
        assert_eq!(json, "\"meeting_scheduled\"");

        let stage: LeadStage = serde_json::from_str("\"followup\"").unwrap();
        assert_eq!(stage, LeadStage::Followup);
    }
}
