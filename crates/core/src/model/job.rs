use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::JobId;

/// Job categories offered on the job board.
pub const JOB_CATEGORIES: [&str; 6] = [
    "Post Construction",
    "Office",
    "Childcare",
    "School",
    "Residential",
    "Commercial",
];

/// Service areas a job can be posted in.
pub const JOB_LOCATIONS: [&str; 6] = [
    "Brisbane",
    "Gold Coast",
    "Sunshine Coast",
    "Sydney",
    "Melbourne",
    "Perth",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum JobError {
    #[error("job title cannot be empty")]
    EmptyTitle,

    #[error("job project cannot be empty")]
    EmptyProject,

    #[error("job location cannot be empty")]
    EmptyLocation,

    #[error("job category cannot be empty")]
    EmptyCategory,

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("pay rate must be a positive amount")]
    InvalidPayRate,

    #[error("hours per day must be between 0 and 24")]
    InvalidHoursPerDay,

    #[error("at least one cleaner must be needed")]
    NoCleanersNeeded,

    #[error("unknown job status: {0}")]
    UnknownStatus(String),
}

/// Lifecycle of a job posting. Only open jobs take applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Filled,
    Completed,
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Filled => "filled",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(JobStatus::Open),
            "filled" => Ok(JobStatus::Filled),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(JobError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A cleaning job posted by an administrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: JobId,
    details: ValidatedJob,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Job {
    /// Rehydrate a job from storage without authoring checks.
    #[must_use]
    pub fn from_persisted(
        id: JobId,
        details: ValidatedJob,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            details,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[must_use]
    pub fn details(&self) -> &ValidatedJob {
        &self.details
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.details.title
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.details.project
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.details.description
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.details.location
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.details.category
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.details.start_date
    }

    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.details.end_date
    }

    #[must_use]
    pub fn pay_rate(&self) -> f64 {
        self.details.pay_rate
    }

    #[must_use]
    pub fn hours_per_day(&self) -> f64 {
        self.details.hours_per_day
    }

    #[must_use]
    pub fn cleaners_needed(&self) -> u32 {
        self.details.cleaners_needed
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.details.status
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.details.status == JobStatus::Open
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Case-insensitive match over title, project, location and description.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [
            self.title(),
            self.project(),
            self.location(),
            self.description(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Authoring form for a job posting.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub title: String,
    pub project: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pay_rate: f64,
    pub hours_per_day: f64,
    pub cleaners_needed: u32,
    pub status: JobStatus,
}

impl JobDraft {
    /// Build a draft from an existing job, e.g. to edit it.
    #[must_use]
    pub fn from_job(job: &Job) -> Self {
        let d = job.details.clone();
        Self {
            title: d.title,
            project: d.project,
            description: d.description,
            location: d.location,
            category: d.category,
            start_date: d.start_date,
            end_date: d.end_date,
            pay_rate: d.pay_rate,
            hours_per_day: d.hours_per_day,
            cleaners_needed: d.cleaners_needed,
            status: d.status,
        }
    }

    /// # Errors
    ///
    /// Returns the first `JobError` found. Only the description may be blank.
    pub fn validate(self) -> Result<ValidatedJob, JobError> {
        let title = self.title.trim().to_owned();
        let project = self.project.trim().to_owned();
        let location = self.location.trim().to_owned();
        let category = self.category.trim().to_owned();
        if title.is_empty() {
            return Err(JobError::EmptyTitle);
        }
        if project.is_empty() {
            return Err(JobError::EmptyProject);
        }
        if location.is_empty() {
            return Err(JobError::EmptyLocation);
        }
        if category.is_empty() {
            return Err(JobError::EmptyCategory);
        }
        if self.end_date < self.start_date {
            return Err(JobError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if !self.pay_rate.is_finite() || self.pay_rate <= 0.0 {
            return Err(JobError::InvalidPayRate);
        }
        if !self.hours_per_day.is_finite() || self.hours_per_day <= 0.0 || self.hours_per_day > 24.0
        {
            return Err(JobError::InvalidHoursPerDay);
        }
        if self.cleaners_needed == 0 {
            return Err(JobError::NoCleanersNeeded);
        }

        Ok(ValidatedJob {
            title,
            project,
            description: self.description.trim().to_owned(),
            location,
            category,
            start_date: self.start_date,
            end_date: self.end_date,
            pay_rate: self.pay_rate,
            hours_per_day: self.hours_per_day,
            cleaners_needed: self.cleaners_needed,
            status: self.status,
        })
    }
}

/// Job fields that passed validation, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedJob {
    pub title: String,
    pub project: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pay_rate: f64,
    pub hours_per_day: f64,
    pub cleaners_needed: u32,
    pub status: JobStatus,
}

impl ValidatedJob {
    #[must_use]
    pub fn assign_id(self, id: JobId, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Job {
        Job {
            id,
            details: self,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> JobDraft {
        JobDraft {
            title: "Builders clean".into(),
            project: "Riverside Towers".into(),
            description: "Final clean before handover".into(),
            location: JOB_LOCATIONS[0].into(),
            category: JOB_CATEGORIES[0].into(),
            start_date: date(2025, 3, 1),
            end_date: date(2025, 3, 4),
            pay_rate: 320.0,
            hours_per_day: 7.5,
            cleaners_needed: 4,
            status: JobStatus::Open,
        }
    }

    #[test]
    fn valid_draft_builds_open_job() {
        let now = fixed_now();
        let job = draft().validate().unwrap().assign_id(JobId::new(1), now, now);
        assert!(job.is_open());
        assert_eq!(job.cleaners_needed(), 4);
        assert_eq!(JobDraft::from_job(&job), draft());
    }

    #[test]
    fn rejects_missing_required_fields() {
        let mut d = draft();
        d.project = " ".into();
        assert_eq!(d.validate(), Err(JobError::EmptyProject));

        let mut d = draft();
        d.description.clear();
        assert!(d.validate().is_ok());
    }

    #[test]
    fn rejects_end_before_start() {
        let mut d = draft();
        d.end_date = date(2025, 2, 28);
        assert!(matches!(d.validate(), Err(JobError::EndBeforeStart { .. })));
    }

    #[test]
    fn rejects_nonsense_numbers() {
        let mut d = draft();
        d.pay_rate = 0.0;
        assert_eq!(d.validate(), Err(JobError::InvalidPayRate));

        let mut d = draft();
        d.hours_per_day = 25.0;
        assert_eq!(d.validate(), Err(JobError::InvalidHoursPerDay));

        let mut d = draft();
        d.cleaners_needed = 0;
        assert_eq!(d.validate(), Err(JobError::NoCleanersNeeded));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            JobStatus::Open,
            JobStatus::Filled,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
        }
        assert!("closed".parse::<JobStatus>().is_err());
    }

    #[test]
    fn search_covers_project_and_location() {
        let now = fixed_now();
        let job = draft().validate().unwrap().assign_id(JobId::new(1), now, now);
        assert!(job.matches_search("riverside"));
        assert!(job.matches_search("BRISBANE"));
        assert!(!job.matches_search("perth"));
    }
}
