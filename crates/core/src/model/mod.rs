mod answer;
mod application;
mod course;
mod ids;
mod job;
mod progress;
mod user;

pub use ids::{ApplicationId, CourseId, JobId, LearnerId, ParseIdError, QuestionKey};

pub use answer::{Answer, AnswerError};
pub use application::{Application, ApplicationError, ApplicationStatus};
pub use course::{
    COURSE_CATEGORIES, Course, CourseDraft, CourseError, CourseStatus, Question, QuestionDraft,
    QuestionKind, Section, SectionDraft, ValidatedCourse,
};
pub use job::{JOB_CATEGORIES, JOB_LOCATIONS, Job, JobDraft, JobError, JobStatus, ValidatedJob};
pub use progress::{ProgressCheckpoint, ProgressRecord, ProgressRecordError};
pub use user::{Role, UserError, UserProfile};
