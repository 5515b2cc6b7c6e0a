// src/db/objective_repo.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::objective::{NewObjective, Objective, ObjectiveStatus, ProgressLog},
};

const OBJECTIVE_COLUMNS: &str = r#"
    id, space_id, name, description, value_type, target_value, current_value,
    deadline, status, is_commercial, data_sources, created_at, updated_at
"#;

#[derive(Clone)]
pub struct ObjectiveRepository {
    pool: PgPool,
}

impl ObjectiveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  OBJETIVOS
    // =========================================================================

    /// Objetivos do space com os logs mensais
    pub async fn list(&self, space_id: Uuid) -> Result<Vec<Objective>, AppError> {
        let sql = format!(
            "SELECT {OBJECTIVE_COLUMNS} FROM objectives WHERE space_id = $1 ORDER BY deadline ASC, created_at ASC"
        );
        let mut objectives = sqlx::query_as::<_, Objective>(&sql)
            .bind(space_id)
            .fetch_all(&self.pool)
            .await?;

        let logs = sqlx::query_as::<_, ProgressLog>(
            r#"
            SELECT l.id, l.objective_id, l.month, l.year, l.value, l.description
            FROM progress_logs l
            INNER JOIN objectives o ON o.id = l.objective_id
            WHERE o.space_id = $1
            ORDER BY l.year ASC, l.month ASC
            "#,
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_objective: HashMap<Uuid, Vec<ProgressLog>> = HashMap::new();
        for log in logs {
            by_objective.entry(log.objective_id).or_default().push(log);
        }
        for objective in &mut objectives {
            objective.progress_logs = by_objective.remove(&objective.id).unwrap_or_default();
        }

        Ok(objectives)
    }

    pub async fn find(&self, space_id: Uuid, id: Uuid) -> Result<Option<Objective>, AppError> {
        let sql = format!("SELECT {OBJECTIVE_COLUMNS} FROM objectives WHERE space_id = $1 AND id = $2");
        let objective = sqlx::query_as::<_, Objective>(&sql)
            .bind(space_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(mut objective) = objective else {
            return Ok(None);
        };

        objective.progress_logs = sqlx::query_as::<_, ProgressLog>(
            r#"
            SELECT id, objective_id, month, year, value, description
            FROM progress_logs
            WHERE objective_id = $1
            ORDER BY year ASC, month ASC
            "#,
        )
        .bind(objective.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(objective))
    }

    pub async fn create(
        &self,
        space_id: Uuid,
        input: &NewObjective,
        current_value: Decimal,
        status: ObjectiveStatus,
    ) -> Result<Objective, AppError> {
        let sql = format!(
            r#"
            INSERT INTO objectives (
                space_id, name, description, value_type, target_value,
                current_value, deadline, status, is_commercial, data_sources
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {OBJECTIVE_COLUMNS}
            "#
        );
        let objective = sqlx::query_as::<_, Objective>(&sql)
            .bind(space_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.value_type)
            .bind(input.target_value)
            .bind(current_value)
            .bind(input.deadline)
            .bind(status)
            .bind(input.is_commercial)
            .bind(Json(&input.data_sources))
            .fetch_one(&self.pool)
            .await?;

        Ok(objective)
    }

    /// Grava configuração + snapshot derivado. Os logs não são tocados.
    pub async fn save(&self, objective: &Objective) -> Result<Objective, AppError> {
        let sql = format!(
            r#"
            UPDATE objectives SET
                name = $3, description = $4, value_type = $5, target_value = $6,
                current_value = $7, deadline = $8, status = $9,
                is_commercial = $10, data_sources = $11, updated_at = NOW()
            WHERE space_id = $1 AND id = $2
            RETURNING {OBJECTIVE_COLUMNS}
            "#
        );
        let mut saved = sqlx::query_as::<_, Objective>(&sql)
            .bind(objective.space_id)
            .bind(objective.id)
            .bind(&objective.name)
            .bind(&objective.description)
            .bind(objective.value_type)
            .bind(objective.target_value)
            .bind(objective.current_value)
            .bind(objective.deadline)
            .bind(objective.status)
            .bind(objective.is_commercial)
            .bind(Json(&objective.data_sources))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ObjectiveNotFound)?;

        saved.progress_logs = objective.progress_logs.clone();
        Ok(saved)
    }

    /// Só o snapshot (valor atual + status). Tolerante a ficar defasado.
    pub async fn save_snapshot<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        current_value: Decimal,
        status: ObjectiveStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE objectives SET current_value = $2, status = $3, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(current_value)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, space_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM objectives WHERE space_id = $1 AND id = $2")
            .bind(space_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  LOGS MENSAIS
    // =========================================================================

    /// Um log por (objetivo, mês, ano): se já existe, sobrescreve.
    pub async fn upsert_log<'e, E>(
        &self,
        executor: E,
        objective_id: Uuid,
        month: i32,
        year: i32,
        value: Decimal,
        description: Option<&str>,
    ) -> Result<ProgressLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, ProgressLog>(
            r#"
            INSERT INTO progress_logs (objective_id, month, year, value, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (objective_id, month, year)
            DO UPDATE SET
                value = EXCLUDED.value,
                description = EXCLUDED.description
            RETURNING id, objective_id, month, year, value, description
            "#,
        )
        .bind(objective_id)
        .bind(month)
        .bind(year)
        .bind(value)
        .bind(description)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    pub async fn delete_log<'e, E>(
        &self,
        executor: E,
        objective_id: Uuid,
        month: i32,
        year: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM progress_logs WHERE objective_id = $1 AND month = $2 AND year = $3")
            .bind(objective_id)
            .bind(month)
            .bind(year)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
