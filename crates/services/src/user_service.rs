use std::sync::Arc;

use lms_core::model::{Role, User, UserId};
use storage::repository::UserRepository;
use tracing::info;

use crate::Clock;
use crate::error::UserServiceError;

/// Registration and the current-user selection.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Create a student from name and department and make it the current user.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` if name or department is blank.
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn register_student(
        &self,
        name: &str,
        department: &str,
    ) -> Result<User, UserServiceError> {
        let user = User::new(
            UserId::generate(),
            name,
            department,
            Role::Student,
            self.clock.now(),
        )?;
        self.users.upsert_user(&user).await?;
        self.users.set_current_user(user.id()).await?;
        info!(user_id = %user.id(), department = user.department(), "student registered");
        Ok(user)
    }

    /// Make an existing user current and refresh their last activity.
    ///
    /// Returns `Ok(None)` if no such user exists; the selection is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn sign_in(&self, id: &UserId) -> Result<Option<User>, UserServiceError> {
        let Some(mut user) = self.users.get_user(id).await? else {
            return Ok(None);
        };
        user.touch(self.clock.now());
        self.users.upsert_user(&user).await?;
        self.users.set_current_user(user.id()).await?;
        info!(user_id = %user.id(), "signed in");
        Ok(Some(user))
    }

    /// The selected user, if any. A selection naming a deleted user reads as none.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn current_user(&self) -> Result<Option<User>, UserServiceError> {
        let Some(id) = self.users.current_user_id().await? else {
            return Ok(None);
        };
        Ok(self.users.get_user(&id).await?)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn sign_out(&self) -> Result<(), UserServiceError> {
        self.users.clear_current_user().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn list_students(&self) -> Result<Vec<User>, UserServiceError> {
        let users = self.users.list_users().await?;
        Ok(users.into_iter().filter(User::is_student).collect())
    }
}
