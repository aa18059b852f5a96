#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod job_service;
pub mod progress;
pub mod session_context;
pub mod user_service;

pub use training_core::Clock;
pub use training_core::model::Role;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, CourseFilter};
pub use error::{
    AppServicesError, CatalogError, JobServiceError, ProgressError, SessionContextError,
    UserServiceError,
};
pub use job_service::{ApplicationListItem, JobFilter, JobService, UNKNOWN_JOB_TITLE};
pub use progress::{
    CheckpointStatus, CheckpointWarning, CourseProgressService, CourseSession, NavigationOutcome,
    ProgressListItem, ProgressOverviewService, ProgressSnapshot,
};
pub use session_context::{SessionContext, SessionUser, SubscriptionId};
pub use user_service::UserService;
