use std::collections::BTreeMap;

use chrono::Duration;
use storage::repository::{CourseQuery, CourseRepository, NewCourseRecord, ProgressRepository};
use storage::sqlite::SqliteRepository;
use training_core::model::{
    CourseDraft, CourseId, CourseStatus, LearnerId, ProgressCheckpoint, QuestionDraft,
    QuestionKey, QuestionKind, SectionDraft,
};
use training_core::time::fixed_now;

fn draft(title: &str, category: &str) -> CourseDraft {
    CourseDraft {
        title: title.into(),
        description: "Learn the basics".into(),
        category: category.into(),
        image_url: Some("https://example.com/cover.png".into()),
        status: CourseStatus::Active,
        sections: vec![
            SectionDraft::new(
                "Safety",
                0,
                vec![
                    QuestionDraft::boolean("Gloves on?").with_correct_answer("true"),
                    QuestionDraft::multiple_choice("Pick a mop", ["Flat", "String"]),
                ],
            )
            .with_description("Protective gear"),
            SectionDraft::new("Notes", 1, vec![QuestionDraft::text("Anything else?")]),
        ],
    }
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_course_structure() {
    let repo = connect("memdb_course_roundtrip").await;

    let validated = draft("Office Basics", "Office Cleaning").validate().unwrap();
    let id = repo
        .insert_new_course(NewCourseRecord::new(validated.clone(), fixed_now()))
        .await
        .unwrap();

    let fetched = repo.get_course(id).await.unwrap().expect("course");
    assert_eq!(fetched, validated.assign_id(id, fixed_now(), fixed_now()));
    assert_eq!(fetched.section_count(), 2);
    assert_eq!(
        fetched.question(QuestionKey::new(0, 1)).unwrap().options(),
        ["Flat", "String"]
    );
    assert_eq!(
        fetched.question(QuestionKey::new(1, 0)).unwrap().kind(),
        QuestionKind::Text
    );
    assert!(repo.get_course(CourseId::new(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_upsert_replaces_sections_and_filters_by_status() {
    let repo = connect("memdb_course_upsert").await;

    let office = repo
        .insert_new_course(NewCourseRecord::new(
            draft("Office Basics", "Office Cleaning").validate().unwrap(),
            fixed_now(),
        ))
        .await
        .unwrap();
    repo.insert_new_course(NewCourseRecord::new(
        draft("School Basics", "School Cleaning").validate().unwrap(),
        fixed_now(),
    ))
    .await
    .unwrap();

    let course = repo.get_course(office).await.unwrap().unwrap();
    let mut edited = CourseDraft::from_course(&course);
    edited.sections.truncate(1);
    let later = fixed_now() + Duration::hours(1);
    let updated = edited
        .validate()
        .unwrap()
        .assign_id(office, course.created_at(), later)
        .with_status(CourseStatus::Inactive, later);
    repo.upsert_course(&updated).await.unwrap();

    let fetched = repo.get_course(office).await.unwrap().unwrap();
    assert_eq!(fetched.section_count(), 1);
    assert_eq!(fetched.created_at(), fixed_now());
    assert_eq!(fetched.updated_at(), later);

    let active = repo.list_courses(&CourseQuery::active()).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title(), "School Basics");

    let office_only = repo
        .list_courses(&CourseQuery::default().with_category("Office Cleaning"))
        .await
        .unwrap();
    assert_eq!(office_only.len(), 1);
    assert_eq!(office_only[0].status(), CourseStatus::Inactive);
}

#[tokio::test]
async fn sqlite_progress_upsert_keeps_started_at() {
    let repo = connect("memdb_progress_upsert").await;
    let course = repo
        .insert_new_course(NewCourseRecord::new(
            draft("Office Basics", "Office Cleaning").validate().unwrap(),
            fixed_now(),
        ))
        .await
        .unwrap();
    let learner = LearnerId::new(7);

    let first = ProgressCheckpoint {
        current_section: 0,
        current_question: 1,
        answers: BTreeMap::from([(QuestionKey::new(0, 0), "true".to_string())]),
        completion_percentage: 33,
        completed: false,
        completed_at: None,
    };
    let start = fixed_now();
    let created = repo
        .upsert_progress(learner, course, &first, start)
        .await
        .unwrap();
    assert_eq!(created.started_at(), start);
    assert_eq!(created.answers(), &first.answers);

    let done_at = start + Duration::minutes(10);
    let mut finished = first.clone();
    finished.current_section = 2;
    finished.current_question = 0;
    finished.answers.insert(QuestionKey::new(0, 1), "Flat".into());
    finished
        .answers
        .insert(QuestionKey::new(1, 0), "Wipe the handles".into());
    finished.completion_percentage = 100;
    finished.completed = true;
    finished.completed_at = Some(done_at);

    let merged = repo
        .upsert_progress(learner, course, &finished, done_at)
        .await
        .unwrap();
    assert_eq!(merged.started_at(), start);
    assert_eq!(merged.updated_at(), done_at);
    assert!(merged.is_completed());
    assert_eq!(merged.completed_at(), Some(done_at));
    assert_eq!(merged.answers().len(), 3);

    let all = repo.list_progress_for_learner(learner).await.unwrap();
    assert_eq!(all, vec![merged]);
    assert!(
        repo.list_progress_for_learner(LearnerId::new(8))
            .await
            .unwrap()
            .is_empty()
    );
}
