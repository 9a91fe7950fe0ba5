//! User role administration

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Promote or demote a user
    pub async fn set_role(&self, user_id: i32, role: Role) -> AppResult<User> {
        let user = self.repository.users.update_role(user_id, role).await?;
        tracing::info!(user_id, %role, "User role changed");
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: i32, acting_user_id: i32) -> AppResult<()> {
        if user_id == acting_user_id {
            return Err(AppError::BusinessRule(
                "You cannot delete your own account".to_string(),
            ));
        }

        self.repository.users.get_by_id(user_id).await?;

        if self.repository.users.has_transactions(user_id).await? {
            return Err(AppError::Conflict(
                "User has borrowing history and cannot be deleted".to_string(),
            ));
        }

        self.repository.users.delete(user_id).await?;
        tracing::info!(user_id, "User deleted");
        Ok(())
    }
}
