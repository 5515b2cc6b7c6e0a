// src/models/client.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "client_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Inactive,
    Churn,
}

// --- NPS ---

// Uma resposta por (cliente, mês, ano). UNIQUE no banco.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NpsRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 9)]
    pub score: i32,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    #[schema(ignore)]
    pub space_id: Uuid,

    #[schema(example = "Acme Ltda")]
    pub company: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    #[schema(example = "2500.00")]
    pub monthly_value: Decimal,
    pub status: ClientStatus,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Carregado à parte (tabela nps_records)
    #[sqlx(skip)]
    pub nps_records: Vec<NpsRecord>,
}

// O que a API devolve: cliente + NPS derivado (nunca persistido)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    #[schema(example = "8.5")]
    pub average_nps: Option<Decimal>,
    pub latest_nps: Option<NpsRecord>,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub company: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub monthly_value: Decimal,
    pub status: ClientStatus,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

// `Some(None)` limpa o campo opcional
#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub company: Option<String>,
    pub contact_name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub monthly_value: Option<Decimal>,
    pub status: Option<ClientStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}
