use std::sync::Arc;

use storage::repository::Storage;
use training_core::model::LearnerId;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::{AppServicesError, UserServiceError};
use crate::job_service::JobService;
use crate::progress::{CourseProgressService, ProgressOverviewService};
use crate::session_context::{SessionContext, SessionUser};
use crate::user_service::UserService;

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    session: SessionContext,
    catalog: Arc<CatalogService>,
    progress: Arc<CourseProgressService>,
    overview: Arc<ProgressOverviewService>,
    jobs: Arc<JobService>,
    users: Arc<UserService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        Self {
            session: SessionContext::new(),
            catalog: Arc::new(CatalogService::new(clock, Arc::clone(&storage.courses))),
            progress: Arc::new(CourseProgressService::new(
                clock,
                Arc::clone(&storage.courses),
                Arc::clone(&storage.progress),
            )),
            overview: Arc::new(ProgressOverviewService::new(
                Arc::clone(&storage.courses),
                Arc::clone(&storage.progress),
            )),
            jobs: Arc::new(JobService::new(
                clock,
                Arc::clone(&storage.jobs),
                Arc::clone(&storage.applications),
            )),
            users: Arc::new(UserService::new(clock, Arc::clone(&storage.users))),
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<CourseProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn overview(&self) -> Arc<ProgressOverviewService> {
        Arc::clone(&self.overview)
    }

    #[must_use]
    pub fn jobs(&self) -> Arc<JobService> {
        Arc::clone(&self.jobs)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    /// Sign a stored account into this app's session.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::UserNotFound` for an unknown id.
    pub async fn sign_in(&self, id: LearnerId) -> Result<SessionUser, UserServiceError> {
        self.users.sign_in(&self.session, id).await
    }
}
