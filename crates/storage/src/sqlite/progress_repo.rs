use chrono::{DateTime, Utc};
use tracing::debug;
use training_core::model::{CourseId, LearnerId, ProgressCheckpoint, ProgressRecord};

use super::SqliteRepository;
use super::mapping::{answers_to_json, conn, id_to_i64, index_to_i64, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "learner_id, course_id, current_section, current_question, \
    answers_json, completion_percentage, completed, started_at, updated_at, completed_at";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM course_progress WHERE learner_id = ?1 AND course_id = ?2"
        ))
        .bind(id_to_i64("learner_id", learner_id.value())?)
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn upsert_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        checkpoint: &ProgressCheckpoint,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let learner = id_to_i64("learner_id", learner_id.value())?;
        let course = id_to_i64("course_id", course_id.value())?;
        let answers_json = answers_to_json(&checkpoint.answers)?;
        let percentage = i64::from(checkpoint.completion_percentage.min(100));

        // started_at is only written on insert.
        sqlx::query(
            r"
            INSERT INTO course_progress (
                learner_id, course_id, current_section, current_question, answers_json,
                completion_percentage, completed, started_at, updated_at, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9)
            ON CONFLICT(learner_id, course_id) DO UPDATE SET
                current_section = excluded.current_section,
                current_question = excluded.current_question,
                answers_json = excluded.answers_json,
                completion_percentage = excluded.completion_percentage,
                completed = excluded.completed,
                updated_at = excluded.updated_at,
                completed_at = excluded.completed_at
            ",
        )
        .bind(learner)
        .bind(course)
        .bind(index_to_i64("current_section", checkpoint.current_section)?)
        .bind(index_to_i64("current_question", checkpoint.current_question)?)
        .bind(answers_json)
        .bind(percentage)
        .bind(i64::from(checkpoint.completed))
        .bind(now)
        .bind(checkpoint.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        debug!(
            learner_id = learner,
            course_id = course,
            section = checkpoint.current_section,
            question = checkpoint.current_question,
            percentage,
            completed = checkpoint.completed,
            "upserted progress"
        );

        self.get_progress(learner_id, course_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn list_progress_for_learner(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM course_progress WHERE learner_id = ?1 ORDER BY course_id ASC"
        ))
        .bind(id_to_i64("learner_id", learner_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }
}
