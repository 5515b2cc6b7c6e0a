// src/db/lead_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{Lead, LeadStage, NewLead},
    services::stage_automation::LeadStageStore,
};

const LEAD_COLUMNS: &str = r#"
    id, space_id, name, company, email, phone, value, temperature, stage,
    last_contact, stage_changed_at, origin, notes, created_at, updated_at
"#;

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Todos os leads do space (o kanban inteiro)
    pub async fn list(&self, space_id: Uuid) -> Result<Vec<Lead>, AppError> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE space_id = $1 ORDER BY created_at ASC"
        );
        let leads = sqlx::query_as::<_, Lead>(&sql)
            .bind(space_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(leads)
    }

    pub async fn find(&self, space_id: Uuid, id: Uuid) -> Result<Option<Lead>, AppError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE space_id = $1 AND id = $2");
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(space_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    pub async fn create(&self, space_id: Uuid, input: &NewLead) -> Result<Lead, AppError> {
        let sql = format!(
            r#"
            INSERT INTO leads (
                space_id, name, company, email, phone, value,
                temperature, stage, last_contact, origin, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {LEAD_COLUMNS}
            "#
        );
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(space_id)
            .bind(&input.name)
            .bind(&input.company)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.value)
            .bind(input.temperature)
            .bind(input.stage)
            .bind(input.last_contact)
            .bind(&input.origin)
            .bind(&input.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(lead)
    }

    /// Grava o lead inteiro (último a escrever vence).
    pub async fn save(&self, lead: &Lead) -> Result<Lead, AppError> {
        let sql = format!(
            r#"
            UPDATE leads SET
                name = $3, company = $4, email = $5, phone = $6, value = $7,
                temperature = $8, stage = $9, last_contact = $10,
                stage_changed_at = $11, origin = $12, notes = $13,
                updated_at = NOW()
            WHERE space_id = $1 AND id = $2
            RETURNING {LEAD_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Lead>(&sql)
            .bind(lead.space_id)
            .bind(lead.id)
            .bind(&lead.name)
            .bind(&lead.company)
            .bind(&lead.email)
            .bind(&lead.phone)
            .bind(lead.value)
            .bind(lead.temperature)
            .bind(lead.stage)
            .bind(lead.last_contact)
            .bind(lead.stage_changed_at)
            .bind(&lead.origin)
            .bind(&lead.notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::LeadNotFound)
    }

    pub async fn delete(&self, space_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE space_id = $1 AND id = $2")
            .bind(space_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// A automação roda fora de qualquer space: enxerga todos.
#[async_trait]
impl LeadStageStore for LeadRepository {
    async fn list_in_stage(&self, stage: LeadStage) -> Result<Vec<Lead>, AppError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE stage = $1");
        let leads = sqlx::query_as::<_, Lead>(&sql)
            .bind(stage)
            .fetch_all(&self.pool)
            .await?;

        Ok(leads)
    }

    async fn move_to_stage(&self, lead_id: Uuid, stage: LeadStage, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET stage = $2, stage_changed_at = $3, last_contact = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(lead_id)
        .bind(stage)
        .bind(at)
        .bind(at.date_naive())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::LeadNotFound);
        }
        Ok(())
    }
}
