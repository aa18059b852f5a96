use std::fmt;

use services::{
    AppServices, ApplicationListItem, Clock, CourseFilter, JobFilter, ProgressListItem, Role,
};
use tracing::debug;
use training_core::model::{CourseId, CourseStatus, Job, JobId, JobStatus, LearnerId};

mod config;
mod telemetry;
mod walkthrough;

use config::{Config, normalize_sqlite_url, prepare_sqlite_file};

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidId { flag: &'static str, raw: String },
    InvalidChoice {
        flag: &'static str,
        expected: &'static str,
        raw: String,
    },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "a command is required"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidChoice {
                flag,
                expected,
                raw,
            } => write!(f, "invalid {flag} value (expected {expected}): {raw}"),
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

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse::<T>()
        .map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn parse_choice<T: std::str::FromStr>(
    flag: &'static str,
    expected: &'static str,
    raw: String,
) -> Result<T, ArgsError> {
    raw.parse::<T>().map_err(|_| ArgsError::InvalidChoice {
        flag,
        expected,
        raw,
    })
}

const COMMANDS: &[&str] = &[
    "courses",
    "progress",
    "take",
    "status",
    "register",
    "role",
    "jobs",
    "apply",
    "applications",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Courses {
        category: Option<String>,
        search: Option<String>,
    },
    Progress {
        learner: LearnerId,
    },
    Take {
        learner: LearnerId,
        course: CourseId,
    },
    Status {
        admin: LearnerId,
        course: CourseId,
        status: CourseStatus,
    },
    Register {
        learner: LearnerId,
        name: String,
    },
    SetRole {
        admin: LearnerId,
        user: LearnerId,
        role: Role,
    },
    Jobs(JobFilter),
    Apply {
        learner: LearnerId,
        job: JobId,
        message: String,
    },
    Applications {
        learner: LearnerId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(
        config: &Config,
        mut args: impl Iterator<Item = String>,
    ) -> Result<Option<Self>, ArgsError> {
        let name = args.next().ok_or(ArgsError::MissingCommand)?;
        if matches!(name.as_str(), "--help" | "-h" | "help") {
            return Ok(None);
        }
        if !COMMANDS.contains(&name.as_str()) {
            return Err(ArgsError::UnknownCommand(name));
        }

        let mut db_url = config.db_url.clone();
        let mut learner = config.learner;
        let mut admin: Option<LearnerId> = None;
        let mut course: Option<CourseId> = None;
        let mut category: Option<String> = None;
        let mut search: Option<String> = None;
        let mut location: Option<String> = None;
        let mut job_status: Option<JobStatus> = None;
        let mut user: Option<LearnerId> = None;
        let mut job: Option<JobId> = None;
        let mut display_name: Option<String> = None;
        let mut message = String::new();
        // Meaning depends on the command: course status or role.
        let mut set: Option<String> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--learner" => {
                    learner = Some(parse_id("--learner", require_value(&mut args, "--learner")?)?);
                }
                "--admin" => {
                    admin = Some(parse_id("--admin", require_value(&mut args, "--admin")?)?);
                }
                "--course" => {
                    course = Some(parse_id("--course", require_value(&mut args, "--course")?)?);
                }
                "--category" => category = Some(require_value(&mut args, "--category")?),
                "--search" => search = Some(require_value(&mut args, "--search")?),
                "--location" => location = Some(require_value(&mut args, "--location")?),
                "--status" => {
                    job_status = Some(parse_choice(
                        "--status",
                        "open, filled, completed or cancelled",
                        require_value(&mut args, "--status")?,
                    )?);
                }
                "--user" => {
                    user = Some(parse_id("--user", require_value(&mut args, "--user")?)?);
                }
                "--job" => {
                    job = Some(parse_id("--job", require_value(&mut args, "--job")?)?);
                }
                "--name" => display_name = Some(require_value(&mut args, "--name")?),
                "--message" => message = require_value(&mut args, "--message")?,
                "--set" => set = Some(require_value(&mut args, "--set")?),
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let learner = || learner.ok_or(ArgsError::MissingFlag { flag: "--learner" });
        let course = || course.ok_or(ArgsError::MissingFlag { flag: "--course" });
        let admin = || admin.ok_or(ArgsError::MissingFlag { flag: "--admin" });
        let set = || set.clone().ok_or(ArgsError::MissingFlag { flag: "--set" });
        let command = match name.as_str() {
            "courses" => Command::Courses { category, search },
            "register" => Command::Register {
                learner: learner()?,
                name: display_name.ok_or(ArgsError::MissingFlag { flag: "--name" })?,
            },
            "role" => Command::SetRole {
                admin: admin()?,
                user: user.ok_or(ArgsError::MissingFlag { flag: "--user" })?,
                role: parse_choice("--set", "cleaner or admin", set()?)?,
            },
            "jobs" => Command::Jobs(JobFilter {
                category,
                location,
                status: job_status,
                search,
            }),
            "apply" => Command::Apply {
                learner: learner()?,
                job: job.ok_or(ArgsError::MissingFlag { flag: "--job" })?,
                message,
            },
            "applications" => Command::Applications {
                learner: learner()?,
            },
            "progress" => Command::Progress {
                learner: learner()?,
            },
            "take" => Command::Take {
                learner: learner()?,
                course: course()?,
            },
            _ => Command::Status {
                admin: admin()?,
                course: course()?,
                status: parse_choice("--set", "active or inactive", set()?)?,
            },
        };

        Ok(Some(Self { db_url, command }))
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- courses  [--category <name>] [--search <text>]");
    eprintln!("  cargo run -p app -- progress --learner <id>");
    eprintln!("  cargo run -p app -- take     --learner <id> --course <id>");
    eprintln!("  cargo run -p app -- status   --admin <id> --course <id> --set <active|inactive>");
    eprintln!("  cargo run -p app -- register --learner <id> --name <display name>");
    eprintln!("  cargo run -p app -- role     --admin <id> --user <id> --set <cleaner|admin>");
    eprintln!(
        "  cargo run -p app -- jobs     [--category <name>] [--location <city>] [--status <status>] [--search <text>]"
    );
    eprintln!("  cargo run -p app -- apply    --learner <id> --job <id> [--message <text>]");
    eprintln!("  cargo run -p app -- applications --learner <id>");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: {})", Config::DEFAULT_DB_URL);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRAINING_DB_URL, TRAINING_LEARNER_ID, TRAINING_LOG (or RUST_LOG)");
}

fn print_items(heading: &str, items: &[ProgressListItem]) {
    println!("{heading}:");
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        match item.completed_at {
            Some(at) => println!(
                "  #{} {} [{}] completed {}",
                item.course_id,
                item.title,
                item.category,
                at.format("%Y-%m-%d")
            ),
            None => println!(
                "  #{} {} [{}] {}% in {} (last active {})",
                item.course_id,
                item.title,
                item.category,
                item.completion_percentage,
                item.current_section,
                item.updated_at.format("%Y-%m-%d")
            ),
        }
    }
}

fn print_job(job: &Job) {
    println!(
        "#{} {} ({}) [{}] {} | {} to {} | ${:.2}/day, {}h/day, {} cleaner(s) | {}",
        job.id(),
        job.title(),
        job.project(),
        job.category(),
        job.location(),
        job.start_date(),
        job.end_date(),
        job.pay_rate(),
        job.hours_per_day(),
        job.cleaners_needed(),
        job.status()
    );
}

fn print_application(item: &ApplicationListItem) {
    println!(
        "  application #{} for job #{} {} [{}] applied {}",
        item.application_id,
        item.job_id,
        item.job_title,
        item.status,
        item.applied_at.format("%Y-%m-%d")
    );
    if let Some(notes) = &item.admin_notes {
        println!("    notes: {notes}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    telemetry::init(config.log_filter.as_deref())?;

    let Some(args) = Args::parse(&config, std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    // Open + migrate SQLite at startup; services stay storage-agnostic.
    prepare_sqlite_file(&args.db_url)?;
    debug!(db_url = %args.db_url, "opening training database");
    let services = AppServices::new_sqlite(&args.db_url, Clock::default_clock()).await?;

    match args.command {
        Command::Courses { category, search } => {
            let filter = CourseFilter { category, search };
            let courses = services.catalog().browse(&filter).await?;
            if courses.is_empty() {
                println!("No active courses. Run the storage seed binary to add samples.");
            }
            for course in courses {
                println!(
                    "#{} {} [{}] {} section(s), {} question(s)",
                    course.id(),
                    course.title(),
                    course.category(),
                    course.section_count(),
                    course.total_questions()
                );
            }
        }
        Command::Progress { learner } => {
            let overview = services.overview();
            print_items("In progress", &overview.in_progress(learner).await?);
            print_items("Completed", &overview.completed(learner).await?);
        }
        Command::Take { learner, course } => {
            services.sign_in(learner).await?;
            let progress = services.progress();
            let mut session = progress.start(learner, course).await?;
            walkthrough::run(&progress, &mut session).await?;
            services.session().sign_out();
        }
        Command::Status {
            admin,
            course,
            status,
        } => {
            // The stored account decides whether this id may act as admin.
            services.sign_in(admin).await?;
            let actor = services.session().require_admin()?;
            let updated = services.catalog().set_status(&actor, course, status).await?;
            println!("#{} {} is now {}", updated.id(), updated.title(), status.as_str());
        }
        Command::Register { learner, name } => {
            let profile = services.users().register(learner, &name).await?;
            println!(
                "Registered #{} {} as {}",
                profile.id(),
                profile.display_name(),
                profile.role()
            );
        }
        Command::SetRole { admin, user, role } => {
            let actor = services.sign_in(admin).await?;
            let updated = services.users().set_role(&actor, user, role).await?;
            println!("#{} {} is now {}", updated.id(), updated.display_name(), updated.role());
        }
        Command::Jobs(filter) => {
            let jobs = services.jobs().browse(&filter).await?;
            if jobs.is_empty() {
                println!("No jobs match. Run the storage seed binary to add samples.");
            }
            for job in &jobs {
                print_job(job);
            }
        }
        Command::Apply {
            learner,
            job,
            message,
        } => {
            let applicant = services.sign_in(learner).await?;
            let application = services.jobs().apply(&applicant, job, &message).await?;
            println!(
                "Application #{} for job #{} is {}",
                application.id(),
                application.job_id(),
                application.status()
            );
        }
        Command::Applications { learner } => {
            let items = services.jobs().my_applications(learner).await?;
            println!("Applications:");
            if items.is_empty() {
                println!("  (none)");
            }
            for item in &items {
                print_application(item);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
