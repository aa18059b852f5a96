use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{ApplicationId, JobId, LearnerId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApplicationError {
    #[error("unknown application status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(ApplicationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A cleaner's application for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    id: ApplicationId,
    job_id: JobId,
    learner_id: LearnerId,
    message: String,
    status: ApplicationStatus,
    admin_notes: Option<String>,
    applied_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Application {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: ApplicationId,
        job_id: JobId,
        learner_id: LearnerId,
        message: String,
        status: ApplicationStatus,
        admin_notes: Option<String>,
        applied_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            job_id,
            learner_id,
            message,
            status,
            admin_notes,
            applied_at,
            updated_at,
        }
    }

    /// Record an administrator's decision. Blank notes are dropped.
    #[must_use]
    pub fn reviewed(
        mut self,
        status: ApplicationStatus,
        notes: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.status = status;
        self.admin_notes = notes
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        self.updated_at = updated_at;
        self
    }

    #[must_use]
    pub fn id(&self) -> ApplicationId {
        self.id
    }

    #[must_use]
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    #[must_use]
    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    #[must_use]
    pub fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn review_sets_status_and_trims_notes() {
        let now = fixed_now();
        let app = Application::from_persisted(
            ApplicationId::new(1),
            JobId::new(2),
            LearnerId::new(3),
            "Available all week".into(),
            ApplicationStatus::Pending,
            None,
            now,
            now,
        );
        let later = now + Duration::days(1);

        let approved = app
            .clone()
            .reviewed(ApplicationStatus::Approved, Some(" see you monday ".into()), later);
        assert_eq!(approved.status(), ApplicationStatus::Approved);
        assert_eq!(approved.admin_notes(), Some("see you monday"));
        assert_eq!(approved.applied_at(), now);
        assert_eq!(approved.updated_at(), later);

        let rejected = app.reviewed(ApplicationStatus::Rejected, Some("   ".into()), later);
        assert_eq!(rejected.admin_notes(), None);
    }

    #[test]
    fn status_parses() {
        assert_eq!("approved".parse(), Ok(ApplicationStatus::Approved));
        assert_eq!(
            "maybe".parse::<ApplicationStatus>(),
            Err(ApplicationError::UnknownStatus("maybe".into()))
        );
    }
}
