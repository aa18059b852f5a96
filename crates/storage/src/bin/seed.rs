use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use storage::repository::{CourseQuery, JobQuery, NewCourseRecord, NewJobRecord, Storage};
use training_core::model::{
    COURSE_CATEGORIES, CourseDraft, JOB_CATEGORIES, JOB_LOCATIONS, JobDraft, JobStatus, LearnerId,
    ProgressCheckpoint, QuestionDraft, QuestionKey, Role, SectionDraft, UserProfile,
};

const SEED_ADMIN: LearnerId = LearnerId::new(1);

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    learner: Option<LearnerId>,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLearner { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLearner { raw } => write!(f, "invalid --learner value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TRAINING_DB_URL")
            .unwrap_or_else(|_| "sqlite://training.sqlite3?mode=rwc".into());
        let mut learner = std::env::var("TRAINING_LEARNER_ID")
            .ok()
            .and_then(|value| value.parse::<LearnerId>().ok());
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--learner" => {
                    let value = require_value(&mut args, "--learner")?;
                    let parsed = value
                        .parse::<LearnerId>()
                        .map_err(|_| ArgsError::InvalidLearner { raw: value.clone() })?;
                    learner = Some(parsed);
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            learner,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://training.sqlite3?mode=rwc)");
    eprintln!("  --learner <id>            Also register this cleaner with half-finished progress");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TRAINING_DB_URL, TRAINING_LEARNER_ID");
}

fn sample_courses() -> Vec<CourseDraft> {
    vec![
        CourseDraft {
            title: "Office Cleaning Fundamentals".into(),
            description: "Daily routines for desks, kitchens and washrooms in shared offices."
                .into(),
            category: COURSE_CATEGORIES[1].into(),
            image_url: None,
            status: Default::default(),
            sections: vec![
                SectionDraft::new(
                    "Before you start",
                    0,
                    vec![
                        QuestionDraft::boolean("Do you wear gloves when handling chemicals?")
                            .with_correct_answer("true"),
                        QuestionDraft::multiple_choice(
                            "Which cloth is best for glass partitions?",
                            ["Microfibre", "Paper towel", "Sponge"],
                        )
                        .with_correct_answer("Microfibre"),
                    ],
                )
                .with_description("Safety gear and equipment checks"),
                SectionDraft::new(
                    "Kitchens and washrooms",
                    1,
                    vec![
                        QuestionDraft::multiple_choice(
                            "What do you clean first in a washroom?",
                            ["Toilets", "Mirrors and basins", "Floors"],
                        )
                        .with_correct_answer("Mirrors and basins"),
                        QuestionDraft::text("Describe how you restock a kitchen."),
                    ],
                ),
            ],
        },
        CourseDraft {
            title: "Childcare Centre Hygiene".into(),
            description: "Keeping play areas and nap rooms safe for young children.".into(),
            category: COURSE_CATEGORIES[2].into(),
            image_url: None,
            status: Default::default(),
            sections: vec![SectionDraft::new(
                "Play areas",
                0,
                vec![
                    QuestionDraft::boolean("Are toys sanitised daily?").with_correct_answer("true"),
                    QuestionDraft::text("Which products are safe around toddlers?"),
                ],
            )],
        },
        CourseDraft {
            title: "Post Construction Clean-up".into(),
            description: "Removing dust and debris after builders leave a site.".into(),
            category: COURSE_CATEGORIES[0].into(),
            image_url: None,
            status: Default::default(),
            sections: vec![SectionDraft::new(
                "Dust control",
                0,
                vec![QuestionDraft::multiple_choice(
                    "Which vacuum filter traps fine plaster dust?",
                    ["HEPA", "Foam", "None"],
                )
                .with_correct_answer("HEPA")],
            )],
        },
    ]
}

fn sample_jobs(today: NaiveDate) -> Vec<JobDraft> {
    let from = |days: u64| today.checked_add_days(Days::new(days)).unwrap_or(today);
    vec![
        JobDraft {
            title: "School holiday deep clean".into(),
            project: "Riverside State School".into(),
            description: "Classrooms, halls and amenities before term starts.".into(),
            location: JOB_LOCATIONS[0].into(),
            category: JOB_CATEGORIES[3].into(),
            start_date: from(14),
            end_date: from(25),
            pay_rate: 250.0,
            hours_per_day: 8.0,
            cleaners_needed: 6,
            status: JobStatus::Open,
        },
        JobDraft {
            title: "Builders clean, apartment tower".into(),
            project: "Harbour View Residences".into(),
            description: "Final dust and window clean across twelve floors.".into(),
            location: JOB_LOCATIONS[2].into(),
            category: JOB_CATEGORIES[0].into(),
            start_date: from(7),
            end_date: from(11),
            pay_rate: 280.0,
            hours_per_day: 9.0,
            cleaners_needed: 4,
            status: JobStatus::Open,
        },
        JobDraft {
            title: "Evening office cleaning".into(),
            project: "Eagle Street Offices".into(),
            description: "Desks, kitchens and washrooms, Monday to Friday.".into(),
            location: JOB_LOCATIONS[0].into(),
            category: JOB_CATEGORIES[1].into(),
            start_date: from(3),
            end_date: from(33),
            pay_rate: 190.0,
            hours_per_day: 4.0,
            cleaners_needed: 2,
            status: JobStatus::Open,
        },
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let existing = storage.courses.list_courses(&CourseQuery::default()).await?;
    let mut seeded = 0_usize;
    for draft in sample_courses() {
        if existing.iter().any(|c| c.title() == draft.title) {
            continue;
        }
        let validated = draft.validate()?;
        storage
            .courses
            .insert_new_course(NewCourseRecord::new(validated, now))
            .await?;
        seeded += 1;
    }

    if storage.users.get_user(SEED_ADMIN).await?.is_none() {
        let admin = UserProfile::new(SEED_ADMIN, "Site Admin", Role::Admin, now)?;
        storage.users.upsert_user(&admin).await?;
        println!("Seeded admin account {SEED_ADMIN}");
    }

    let existing_jobs = storage.jobs.list_jobs(&JobQuery::default()).await?;
    let mut seeded_jobs = 0_usize;
    for draft in sample_jobs(now.date_naive()) {
        if existing_jobs.iter().any(|j| j.title() == draft.title) {
            continue;
        }
        storage
            .jobs
            .insert_new_job(NewJobRecord::new(draft.validate()?, now))
            .await?;
        seeded_jobs += 1;
    }

    if let Some(learner) = args.learner {
        if storage.users.get_user(learner).await?.is_none() {
            let cleaner =
                UserProfile::new(learner, format!("Cleaner {learner}"), Role::Cleaner, now)?;
            storage.users.upsert_user(&cleaner).await?;
        }
        let courses = storage.courses.list_courses(&CourseQuery::active()).await?;
        if let Some(course) = courses.first() {
            let checkpoint = ProgressCheckpoint {
                current_section: 0,
                current_question: 1,
                answers: BTreeMap::from([(QuestionKey::new(0, 0), "true".to_string())]),
                completion_percentage: u8::try_from(100 / course.total_questions().max(1))
                    .unwrap_or(100),
                completed: false,
                completed_at: None,
            };
            storage
                .progress
                .upsert_progress(learner, course.id(), &checkpoint, now)
                .await?;
            println!("Seeded progress for learner {learner} in course {}", course.id());
        }
    }

    println!(
        "Seeded {seeded} course(s) and {seeded_jobs} job(s) into {}",
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
