// src/db/space_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::space::Space};

#[derive(Clone)]
pub struct SpaceRepository {
    pool: PgPool,
}

impl SpaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere o space (roda dentro da transação do serviço)
    pub async fn create_space<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Space, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let space = sqlx::query_as::<_, Space>(
            r#"
            INSERT INTO spaces (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await?;

        Ok(space)
    }

    pub async fn add_member<'e, E>(&self, executor: E, user_id: Uuid, space_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO space_members (user_id, space_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(space_id)
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::AlreadySpaceMember;
                    }
                }
                e.into()
            })?;

        Ok(())
    }

    /// O usuário já é membro de um space com esse nome?
    pub async fn user_has_space_with_name(&self, user_id: Uuid, name: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM spaces s
                INNER JOIN space_members m ON m.space_id = s.id
                WHERE m.user_id = $1 AND LOWER(s.name) = LOWER($2)
            )
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Space>, AppError> {
        let spaces = sqlx::query_as::<_, Space>(
            r#"
            SELECT s.id, s.name, s.description, s.created_at, s.updated_at
            FROM spaces s
            INNER JOIN space_members m ON m.space_id = s.id
            WHERE m.user_id = $1
            ORDER BY s.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(spaces)
    }

    pub async fn is_member(&self, user_id: Uuid, space_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM space_members WHERE user_id = $1 AND space_id = $2)",
        )
        .bind(user_id)
        .bind(space_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
