// src/services/space_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SpaceRepository, UserRepository},
    models::space::Space,
};

#[derive(Clone)]
pub struct SpaceService {
    space_repo: SpaceRepository,
    user_repo: UserRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl SpaceService {
    pub fn new(space_repo: SpaceRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { space_repo, user_repo, pool }
    }

    /// Cria o space e, na mesma transação, torna o criador o primeiro membro.
    pub async fn create_space_with_owner(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Space, AppError> {
        if self.space_repo.user_has_space_with_name(owner_id, name).await? {
            return Err(AppError::SpaceNameAlreadyExists(name.to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let space = self.space_repo.create_space(&mut *tx, name, description).await?;
        self.space_repo.add_member(&mut *tx, owner_id, space.id).await?;

        tx.commit().await?;

        tracing::info!("Space {} criado por {}", space.id, owner_id);
        Ok(space)
    }

    pub async fn list_my_spaces(&self, user_id: Uuid) -> Result<Vec<Space>, AppError> {
        self.space_repo.list_by_user(user_id).await
    }

    pub async fn is_member(&self, user_id: Uuid, space_id: Uuid) -> Result<bool, AppError> {
        self.space_repo.is_member(user_id, space_id).await
    }

    /// Convida um usuário já cadastrado para o space atual
    pub async fn add_member_by_email(&self, space_id: Uuid, email: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.space_repo.add_member(&self.pool, user.id, space_id).await
    }
}
