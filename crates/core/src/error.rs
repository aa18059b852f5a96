use thiserror::Error;

use crate::model::{
    AnswerError, ApplicationError, CourseError, JobError, ProgressRecordError, UserError,
};
use crate::tracker::TrackerError;

/// Any domain error raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    ProgressRecord(#[from] ProgressRecordError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error(transparent)]
    User(#[from] UserError),
}
