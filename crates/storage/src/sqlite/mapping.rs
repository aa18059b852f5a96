use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use training_core::model::{
    Application, ApplicationId, ApplicationStatus, CourseId, CourseStatus, Job, JobId, JobStatus,
    LearnerId, ProgressRecord, Question, QuestionKey, QuestionKind, Role, Section, UserProfile,
    ValidatedJob,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_usize(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn index_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn learner_id_from_i64(v: i64) -> Result<LearnerId, StorageError> {
    Ok(LearnerId::new(i64_to_u64("learner_id", v)?))
}

pub(crate) fn job_id_from_i64(v: i64) -> Result<JobId, StorageError> {
    Ok(JobId::new(i64_to_u64("job_id", v)?))
}

pub(crate) fn application_id_from_i64(v: i64) -> Result<ApplicationId, StorageError> {
    Ok(ApplicationId::new(i64_to_u64("application_id", v)?))
}

/// Answers are stored as a JSON object keyed by `"{section}_{question}"`.
pub(crate) fn answers_to_json(answers: &BTreeMap<QuestionKey, String>) -> Result<String, StorageError> {
    let keyed: BTreeMap<String, &str> = answers
        .iter()
        .map(|(k, v)| (k.to_string(), v.as_str()))
        .collect();
    serde_json::to_string(&keyed).map_err(ser)
}

pub(crate) fn answers_from_json(raw: &str) -> Result<BTreeMap<QuestionKey, String>, StorageError> {
    let keyed: BTreeMap<String, String> = serde_json::from_str(raw).map_err(ser)?;
    keyed
        .into_iter()
        .map(|(k, v)| Ok((k.parse::<QuestionKey>().map_err(ser)?, v)))
        .collect()
}

pub(crate) fn parse_status(s: &str) -> Result<CourseStatus, StorageError> {
    s.parse::<CourseStatus>().map_err(ser)
}

pub(crate) fn map_section_row(
    row: &SqliteRow,
    questions: Vec<Question>,
) -> Result<Section, StorageError> {
    let position: i64 = row.try_get("position").map_err(ser)?;
    let order = u32::try_from(position)
        .map_err(|_| StorageError::Serialization(format!("invalid section position: {position}")))?;
    Ok(Section::from_persisted(
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        order,
        questions,
    ))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    let kind = kind.parse::<QuestionKind>().map_err(ser)?;
    let options_json: String = row.try_get("options_json").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;

    Ok(Question::from_persisted(
        row.try_get::<String, _>("text").map_err(ser)?,
        kind,
        options,
        row.try_get::<Option<String>, _>("correct_answer").map_err(ser)?,
        row.try_get::<i64, _>("required").map_err(ser)? != 0,
    ))
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let percentage: i64 = row.try_get("completion_percentage").map_err(ser)?;
    let percentage = u8::try_from(percentage).map_err(|_| {
        StorageError::Serialization(format!("invalid completion_percentage: {percentage}"))
    })?;
    let answers_json: String = row.try_get("answers_json").map_err(ser)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;

    ProgressRecord::from_persisted(
        learner_id_from_i64(row.try_get::<i64, _>("learner_id").map_err(ser)?)?,
        course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        i64_to_usize(
            "current_section",
            row.try_get::<i64, _>("current_section").map_err(ser)?,
        )?,
        i64_to_usize(
            "current_question",
            row.try_get::<i64, _>("current_question").map_err(ser)?,
        )?,
        answers_from_json(&answers_json)?,
        percentage,
        row.try_get::<i64, _>("completed").map_err(ser)? != 0,
        started_at,
        updated_at,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_job_row(row: &SqliteRow) -> Result<Job, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let cleaners: i64 = row.try_get("cleaners_needed").map_err(ser)?;
    let start_date: NaiveDate = row.try_get("start_date").map_err(ser)?;
    let end_date: NaiveDate = row.try_get("end_date").map_err(ser)?;

    let details = ValidatedJob {
        title: row.try_get("title").map_err(ser)?,
        project: row.try_get("project").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        location: row.try_get("location").map_err(ser)?,
        category: row.try_get("category").map_err(ser)?,
        start_date,
        end_date,
        pay_rate: row.try_get("pay_rate").map_err(ser)?,
        hours_per_day: row.try_get("hours_per_day").map_err(ser)?,
        cleaners_needed: u32::try_from(cleaners).map_err(|_| {
            StorageError::Serialization(format!("invalid cleaners_needed: {cleaners}"))
        })?,
        status: status.parse::<JobStatus>().map_err(ser)?,
    };

    Ok(Job::from_persisted(
        job_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        details,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_application_row(row: &SqliteRow) -> Result<Application, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    Ok(Application::from_persisted(
        application_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        job_id_from_i64(row.try_get::<i64, _>("job_id").map_err(ser)?)?,
        learner_id_from_i64(row.try_get::<i64, _>("learner_id").map_err(ser)?)?,
        row.try_get("message").map_err(ser)?,
        status.parse::<ApplicationStatus>().map_err(ser)?,
        row.try_get("admin_notes").map_err(ser)?,
        row.try_get("applied_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<UserProfile, StorageError> {
    let role: String = row.try_get("role").map_err(ser)?;
    Ok(UserProfile::from_persisted(
        learner_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get("display_name").map_err(ser)?,
        role.parse::<Role>().map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_json_uses_underscore_keys() {
        let answers = BTreeMap::from([
            (QuestionKey::new(0, 1), "Flat".to_string()),
            (QuestionKey::new(2, 0), "true".to_string()),
        ]);
        let json = answers_to_json(&answers).unwrap();
        assert_eq!(json, r#"{"0_1":"Flat","2_0":"true"}"#);
        assert_eq!(answers_from_json(&json).unwrap(), answers);
    }

    #[test]
    fn malformed_answer_key_is_a_serialization_error() {
        let err = answers_from_json(r#"{"first":"x"}"#).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
