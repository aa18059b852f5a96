use std::sync::Arc;

use storage::repository::UserRepository;
use tracing::info;
use training_core::model::{LearnerId, Role, UserProfile};

use crate::Clock;
use crate::error::UserServiceError;
use crate::session_context::{SessionContext, SessionUser};

/// Accounts and their roles. Role checks always read the stored account.
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

    /// Create a cleaner account.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::AlreadyRegistered` if the id is taken,
    /// `UserServiceError::User` for a blank name, and
    /// `UserServiceError::Storage` if persistence fails.
    pub async fn register(
        &self,
        id: LearnerId,
        display_name: &str,
    ) -> Result<UserProfile, UserServiceError> {
        if self.users.get_user(id).await?.is_some() {
            return Err(UserServiceError::AlreadyRegistered(id));
        }
        let profile = UserProfile::new(id, display_name, Role::Cleaner, self.clock.now())?;
        self.users.upsert_user(&profile).await?;
        info!(user_id = %id, "user registered");
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if the lookup fails.
    pub async fn get_user(&self, id: LearnerId) -> Result<Option<UserProfile>, UserServiceError> {
        Ok(self.users.get_user(id).await?)
    }

    /// Sign the stored account in, with the role it holds in storage.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::UserNotFound` for an unknown id.
    pub async fn sign_in(
        &self,
        session: &SessionContext,
        id: LearnerId,
    ) -> Result<SessionUser, UserServiceError> {
        let user = SessionUser::from_profile(&self.require_user(id).await?);
        session.sign_in(user.clone());
        Ok(user)
    }

    /// All accounts, or only those with `role`. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Access` unless the stored `actor` is an
    /// admin.
    pub async fn list_users(
        &self,
        actor: &SessionUser,
        role: Option<Role>,
    ) -> Result<Vec<UserProfile>, UserServiceError> {
        self.require_admin(actor).await?;
        Ok(self.users.list_users(role).await?)
    }

    /// Promote or demote another account. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Access` unless the stored `actor` is an
    /// admin, `UserServiceError::OwnRole` when targeting the actor, and
    /// `UserServiceError::UserNotFound` for an unknown target.
    pub async fn set_role(
        &self,
        actor: &SessionUser,
        target: LearnerId,
        role: Role,
    ) -> Result<UserProfile, UserServiceError> {
        self.require_admin(actor).await?;
        if target == actor.id {
            return Err(UserServiceError::OwnRole);
        }
        let updated = self
            .require_user(target)
            .await?
            .with_role(role, self.clock.now());
        self.users.upsert_user(&updated).await?;
        info!(user_id = %target, role = %role, actor = %actor.id, "user role changed");
        Ok(updated)
    }

    async fn require_user(&self, id: LearnerId) -> Result<UserProfile, UserServiceError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(UserServiceError::UserNotFound(id))
    }

    // The session copy of a role may be stale; the stored account decides.
    async fn require_admin(&self, actor: &SessionUser) -> Result<(), UserServiceError> {
        let stored = self.require_user(actor.id).await?;
        SessionUser::from_profile(&stored).ensure_admin()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionContextError;
    use storage::repository::InMemoryRepository;
    use training_core::time::fixed_clock;

    async fn service_with_admin() -> (UserService, SessionUser) {
        let repo = Arc::new(InMemoryRepository::new());
        let service = UserService::new(fixed_clock(), repo.clone());
        let admin = UserProfile::new(LearnerId::new(1), "Site Admin", Role::Admin, fixed_clock().now())
            .unwrap();
        repo.upsert_user(&admin).await.unwrap();
        (service, SessionUser::from_profile(&admin))
    }

    #[tokio::test]
    async fn sign_in_uses_stored_role() {
        let (service, _) = service_with_admin().await;
        service.register(LearnerId::new(2), "Kim").await.unwrap();
        let session = SessionContext::new();

        let user = service.sign_in(&session, LearnerId::new(2)).await.unwrap();
        assert_eq!(user.role, Role::Cleaner);
        assert_eq!(session.require_admin(), Err(SessionContextError::NotAdmin));

        service.sign_in(&session, LearnerId::new(1)).await.unwrap();
        assert!(session.require_admin().is_ok());

        let err = service
            .sign_in(&session, LearnerId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn claimed_admin_role_is_not_trusted() {
        let (service, _) = service_with_admin().await;
        service.register(LearnerId::new(2), "Kim").await.unwrap();
        service.register(LearnerId::new(3), "Ola").await.unwrap();

        let pretender = SessionUser::new(LearnerId::new(2), "Kim", Role::Admin);
        let err = service
            .set_role(&pretender, LearnerId::new(3), Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UserServiceError::Access(SessionContextError::NotAdmin)
        ));
    }

    #[tokio::test]
    async fn admin_promotes_cleaner_but_not_self() {
        let (service, admin) = service_with_admin().await;
        service.register(LearnerId::new(2), "Kim").await.unwrap();

        let promoted = service
            .set_role(&admin, LearnerId::new(2), Role::Admin)
            .await
            .unwrap();
        assert!(promoted.is_admin());
        assert!(
            service
                .list_users(&admin, Some(Role::Cleaner))
                .await
                .unwrap()
                .is_empty()
        );

        let err = service
            .set_role(&admin, admin.id, Role::Cleaner)
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::OwnRole));
    }

    #[tokio::test]
    async fn register_rejects_taken_id() {
        let (service, _) = service_with_admin().await;
        let err = service
            .register(LearnerId::new(1), "Again")
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::AlreadyRegistered(_)));
    }
}
