//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use training_core::model::{
    ApplicationId, CourseError, CourseId, JobError, JobId, JobStatus, LearnerId, UserError,
};
use training_core::tracker::TrackerError;

/// Errors emitted by `SessionContext` role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SessionContextError {
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("administrator role required")]
    NotAdmin,
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Access(#[from] SessionContextError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the course progress workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error("user {0} not found")]
    UserNotFound(LearnerId),
    #[error("user {0} already exists")]
    AlreadyRegistered(LearnerId),
    #[error("administrators cannot change their own role")]
    OwnRole,
    #[error(transparent)]
    Access(#[from] SessionContextError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `JobService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobServiceError {
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("job {job_id} is {status} and not taking applications")]
    JobNotOpen { job_id: JobId, status: JobStatus },
    #[error("already applied for job {0}")]
    AlreadyApplied(JobId),
    #[error(transparent)]
    Access(#[from] SessionContextError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
