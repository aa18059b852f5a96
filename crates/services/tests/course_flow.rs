use services::{
    AppServices, CheckpointStatus, Clock, CourseFilter, ProgressSnapshot, Role, SessionUser,
};
use training_core::model::{
    COURSE_CATEGORIES, CourseDraft, CourseStatus, LearnerId, QuestionDraft, SectionDraft,
};
use training_core::time::fixed_now;
use training_core::tracker::Transition;

fn office_course() -> CourseDraft {
    CourseDraft {
        title: "Office Cleaning Fundamentals".into(),
        description: "Desks, kitchens and washrooms".into(),
        category: COURSE_CATEGORIES[1].into(),
        image_url: None,
        status: CourseStatus::Active,
        sections: vec![
            SectionDraft::new(
                "Before you start",
                0,
                vec![
                    QuestionDraft::boolean("Gloves on?").with_correct_answer("true"),
                    QuestionDraft::multiple_choice("Glass cloth?", ["Microfibre", "Paper"]),
                ],
            ),
            SectionDraft::new("Wrap up", 1, vec![QuestionDraft::text("Anything to report?")]),
        ],
    }
}

#[tokio::test]
async fn admin_publishes_and_cleaner_completes_course() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_course_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("services");

    services
        .session()
        .sign_in(SessionUser::new(LearnerId::new(1), "Admin", Role::Admin));
    let admin = services.session().require_admin().unwrap();
    let course_id = services
        .catalog()
        .create_course(&admin, office_course())
        .await
        .unwrap();

    let listed = services
        .catalog()
        .browse(&CourseFilter::default().with_search("washrooms"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let cleaner = LearnerId::new(2);
    services
        .session()
        .sign_in(SessionUser::new(cleaner, "Cleaner", Role::Cleaner));
    assert!(services.session().require_admin().is_err());

    let progress = services.progress();
    let mut session = progress.start(cleaner, course_id).await.unwrap();
    progress.record_raw_answer(&mut session, "true").unwrap();
    let outcome = progress.advance(&mut session).await.unwrap();
    assert!(matches!(outcome.checkpoint, CheckpointStatus::Saved));

    let in_progress = services.overview().in_progress(cleaner).await.unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].completion_percentage, 33);
    assert_eq!(in_progress[0].current_section, "Before you start");

    // resume from storage in a fresh session
    let mut session = progress.start(cleaner, course_id).await.unwrap();
    assert_eq!(
        session.snapshot(),
        ProgressSnapshot {
            section: 0,
            section_count: 2,
            question: 1,
            question_count: 2,
            answered: 1,
            total_questions: 3,
            percentage: 33,
            completed: false,
        }
    );

    progress.record_raw_answer(&mut session, "Microfibre").unwrap();
    progress.advance(&mut session).await.unwrap();
    progress
        .record_raw_answer(&mut session, "All bins emptied")
        .unwrap();
    let done = progress.advance(&mut session).await.unwrap();
    assert!(matches!(done.transition, Transition::Completed { .. }));
    assert_eq!(done.snapshot.percentage, 100);

    let completed = services.overview().completed(cleaner).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].completed_at, Some(fixed_now()));
    assert!(services.overview().in_progress(cleaner).await.unwrap().is_empty());
}

#[tokio::test]
async fn deactivated_course_leaves_catalog_but_keeps_progress() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let admin = SessionUser::new(LearnerId::new(1), "Admin", Role::Admin);
    let course_id = services
        .catalog()
        .create_course(&admin, office_course())
        .await
        .unwrap();

    let learner = LearnerId::new(3);
    let progress = services.progress();
    let mut session = progress.start(learner, course_id).await.unwrap();
    progress.advance(&mut session).await.unwrap();

    services
        .catalog()
        .set_status(&admin, course_id, CourseStatus::Inactive)
        .await
        .unwrap();

    assert!(
        services
            .catalog()
            .browse(&CourseFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
    let items = services.overview().in_progress(learner).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Office Cleaning Fundamentals");
    assert_eq!(items[0].completion_percentage, 0);
}
