// src/db/client_repo.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::client::{Client, NewClient, NpsRecord},
};

const CLIENT_COLUMNS: &str = r#"
    id, space_id, company, contact_name, email, phone, monthly_value,
    status, start_date, notes, created_at, updated_at
"#;

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    /// Lista os clientes do space já com o histórico de NPS
    pub async fn list(&self, space_id: Uuid) -> Result<Vec<Client>, AppError> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE space_id = $1 ORDER BY company ASC"
        );
        let mut clients = sqlx::query_as::<_, Client>(&sql)
            .bind(space_id)
            .fetch_all(&self.pool)
            .await?;

        // Uma query só para o NPS de todo mundo, depois distribui
        let records = sqlx::query_as::<_, NpsRecord>(
            r#"
            SELECT n.id, n.client_id, n.month, n.year, n.score, n.notes, n.recorded_at
            FROM nps_records n
            INNER JOIN clients c ON c.id = n.client_id
            WHERE c.space_id = $1
            ORDER BY n.year ASC, n.month ASC
            "#,
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_client: HashMap<Uuid, Vec<NpsRecord>> = HashMap::new();
        for record in records {
            by_client.entry(record.client_id).or_default().push(record);
        }
        for client in &mut clients {
            client.nps_records = by_client.remove(&client.id).unwrap_or_default();
        }

        Ok(clients)
    }

    pub async fn find(&self, space_id: Uuid, id: Uuid) -> Result<Option<Client>, AppError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE space_id = $1 AND id = $2");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(space_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match client {
            Some(mut c) => {
                c.nps_records = self.list_nps(c.id).await?;
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    pub async fn create(&self, space_id: Uuid, input: &NewClient) -> Result<Client, AppError> {
        let sql = format!(
            r#"
            INSERT INTO clients (
                space_id, company, contact_name, email, phone,
                monthly_value, status, start_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CLIENT_COLUMNS}
            "#
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(space_id)
            .bind(&input.company)
            .bind(&input.contact_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.monthly_value)
            .bind(input.status)
            .bind(input.start_date)
            .bind(&input.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn save(&self, client: &Client) -> Result<Client, AppError> {
        let sql = format!(
            r#"
            UPDATE clients SET
                company = $3, contact_name = $4, email = $5, phone = $6,
                monthly_value = $7, status = $8, start_date = $9, notes = $10,
                updated_at = NOW()
            WHERE space_id = $1 AND id = $2
            RETURNING {CLIENT_COLUMNS}
            "#
        );
        let mut saved = sqlx::query_as::<_, Client>(&sql)
            .bind(client.space_id)
            .bind(client.id)
            .bind(&client.company)
            .bind(&client.contact_name)
            .bind(&client.email)
            .bind(&client.phone)
            .bind(client.monthly_value)
            .bind(client.status)
            .bind(client.start_date)
            .bind(&client.notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        saved.nps_records = client.nps_records.clone();
        Ok(saved)
    }

    pub async fn delete(&self, space_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE space_id = $1 AND id = $2")
            .bind(space_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  NPS
    // =========================================================================

    pub async fn list_nps(&self, client_id: Uuid) -> Result<Vec<NpsRecord>, AppError> {
        let records = sqlx::query_as::<_, NpsRecord>(
            r#"
            SELECT id, client_id, month, year, score, notes, recorded_at
            FROM nps_records
            WHERE client_id = $1
            ORDER BY year ASC, month ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Uma resposta por (cliente, mês, ano): se já existe, sobrescreve.
    pub async fn upsert_nps(
        &self,
        client_id: Uuid,
        month: i32,
        year: i32,
        score: i32,
        notes: Option<&str>,
    ) -> Result<NpsRecord, AppError> {
        let record = sqlx::query_as::<_, NpsRecord>(
            r#"
            INSERT INTO nps_records (client_id, month, year, score, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (client_id, month, year)
            DO UPDATE SET
                score = EXCLUDED.score,
                notes = EXCLUDED.notes,
                recorded_at = NOW()
            RETURNING id, client_id, month, year, score, notes, recorded_at
            "#,
        )
        .bind(client_id)
        .bind(month)
        .bind(year)
        .bind(score)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn delete_nps(&self, client_id: Uuid, month: i32, year: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM nps_records WHERE client_id = $1 AND month = $2 AND year = $3")
            .bind(client_id)
            .bind(month)
            .bind(year)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
