mod session;
mod view;
mod workflow;

// Public API of the progress subsystem.
pub use crate::error::ProgressError;
pub use session::{CourseSession, ProgressSnapshot};
pub use view::{ProgressListItem, ProgressOverviewService, UNKNOWN_COURSE_TITLE};
pub use workflow::{CheckpointStatus, CheckpointWarning, CourseProgressService, NavigationOutcome};
