use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;
use training_core::model::{Course, CourseId, Section};

use super::SqliteRepository;
use super::mapping::{
    conn, course_id_from_i64, id_to_i64, index_to_i64, map_question_row, map_section_row,
    parse_status, ser,
};
use crate::repository::{CourseQuery, CourseRepository, NewCourseRecord, StorageError};

const COURSE_COLUMNS: &str =
    "id, title, description, category, image_url, status, created_at, updated_at";

/// Replace the stored sections and questions of a course.
async fn write_sections(
    tx: &mut SqliteConnection,
    course_id: i64,
    sections: &[Section],
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM course_sections WHERE course_id = ?1")
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

    for section in sections {
        let position = i64::from(section.order());
        sqlx::query(
            r"
            INSERT INTO course_sections (course_id, position, title, description)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(course_id)
        .bind(position)
        .bind(section.title())
        .bind(section.description())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        for (idx, question) in section.questions().iter().enumerate() {
            let options_json = serde_json::to_string(question.options()).map_err(ser)?;
            sqlx::query(
                r"
                INSERT INTO course_questions (
                    course_id, section_position, position, text, kind, options_json,
                    correct_answer, required
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(course_id)
            .bind(position)
            .bind(index_to_i64("question position", idx)?)
            .bind(question.text())
            .bind(question.kind().as_str())
            .bind(options_json)
            .bind(question.correct_answer())
            .bind(i64::from(question.is_required()))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }
    }
    Ok(())
}

impl SqliteRepository {
    async fn load_sections(&self, course_id: i64) -> Result<Vec<Section>, StorageError> {
        let section_rows = sqlx::query(
            r"
            SELECT position, title, description
            FROM course_sections
            WHERE course_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let question_rows = sqlx::query(
            r"
            SELECT section_position, position, text, kind, options_json, correct_answer, required
            FROM course_questions
            WHERE course_id = ?1
            ORDER BY section_position ASC, position ASC
            ",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut sections = Vec::with_capacity(section_rows.len());
        for row in &section_rows {
            let position: i64 = row.try_get("position").map_err(ser)?;
            let mut questions = Vec::new();
            for q in &question_rows {
                if q.try_get::<i64, _>("section_position").map_err(ser)? == position {
                    questions.push(map_question_row(q)?);
                }
            }
            sections.push(map_section_row(row, questions)?);
        }
        Ok(sections)
    }

    async fn course_from_row(&self, row: &SqliteRow) -> Result<Course, StorageError> {
        let id: i64 = row.try_get("id").map_err(ser)?;
        let status: String = row.try_get("status").map_err(ser)?;
        let sections = self.load_sections(id).await?;

        Course::from_persisted(
            course_id_from_i64(id)?,
            row.try_get::<String, _>("title").map_err(ser)?,
            row.try_get::<String, _>("description").map_err(ser)?,
            row.try_get::<String, _>("category").map_err(ser)?,
            row.try_get::<Option<String>, _>("image_url").map_err(ser)?,
            parse_status(&status)?,
            sections,
            row.try_get("created_at").map_err(ser)?,
            row.try_get("updated_at").map_err(ser)?,
        )
        .map_err(ser)
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_new_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError> {
        let draft = course.course;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO courses (title, description, category, image_url, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.image_url.as_deref())
        .bind(draft.status.as_str())
        .bind(course.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let id = res.last_insert_rowid();
        write_sections(&mut *tx, id, &draft.sections).await?;
        tx.commit().await.map_err(conn)?;

        debug!(course_id = id, sections = draft.sections.len(), "inserted course");
        course_id_from_i64(id)
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let id = id_to_i64("course_id", course.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, description, category, image_url, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                image_url = excluded.image_url,
                status = excluded.status,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id)
        .bind(course.title())
        .bind(course.description())
        .bind(course.category())
        .bind(course.image_url())
        .bind(course.status().as_str())
        .bind(course.created_at())
        .bind(course.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        write_sections(&mut *tx, id, course.sections()).await?;
        tx.commit().await.map_err(conn)?;

        debug!(course_id = id, status = course.status().as_str(), "upserted course");
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"))
            .bind(id_to_i64("course_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => self.course_from_row(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY id ASC
            "
        ))
        .bind(query.category.as_deref())
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in &rows {
            courses.push(self.course_from_row(row).await?);
        }
        Ok(courses)
    }
}
