// src/models/objective.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "objective_value_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Financial,
    Quantity,
    Percentage,
}

// Sempre derivado. O usuário nunca escolhe o status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "objective_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    OnTrack,
    AtRisk,
    Behind,
}

// De onde um objetivo comercial tira o valor atual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Crm,
    Clients,
}

// --- LOG MENSAL ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLog {
    pub id: Uuid,
    pub objective_id: Uuid,
    #[schema(example = 4)]
    pub month: i32,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = "120.0")]
    pub value: Decimal,
    pub description: Option<String>,
}

// --- OBJETIVO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: Uuid,
    #[schema(ignore)]
    pub space_id: Uuid,

    #[schema(example = "Faturamento anual")]
    pub name: String,
    pub description: Option<String>,

    pub value_type: ValueType,
    #[schema(example = "500000.00")]
    pub target_value: Decimal,

    // No banco é só um snapshot (pode estar velho); a leitura sempre rederiva.
    pub current_value: Decimal,
    pub deadline: NaiveDate,
    pub status: ObjectiveStatus,

    pub is_commercial: bool,
    #[sqlx(json)]
    pub data_sources: Vec<DataSource>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    pub progress_logs: Vec<ProgressLog>,
}

// Configuração de um objetivo novo (addObjective)
#[derive(Debug, Clone)]
pub struct NewObjective {
    pub name: String,
    pub description: Option<String>,
    pub value_type: ValueType,
    pub target_value: Decimal,
    pub deadline: NaiveDate,
    pub is_commercial: bool,
    pub data_sources: Vec<DataSource>,
}

// Edição parcial (updateObjective)
#[derive(Debug, Clone, Default)]
pub struct ObjectiveChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub value_type: Option<ValueType>,
    pub target_value: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
    pub is_commercial: Option<bool>,
    pub data_sources: Option<Vec<DataSource>>,
}

// --- VISÕES DERIVADAS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthCell {
    #[schema(example = 11)]
    pub month: u32,
    #[schema(example = 2024)]
    pub year: i32,
    pub has_log: bool,
    pub is_past: bool,
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveStats {
    pub total: usize,
    pub on_track: usize,
    pub at_risk: usize,
    pub behind: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveProgress {
    pub objective_id: Uuid,
    #[schema(example = 42)]
    pub percent: i64,
    pub status: ObjectiveStatus,
    pub current_value: Decimal,
    pub months: Vec<MonthCell>,
}
