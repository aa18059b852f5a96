use std::io::Write;

use services::{CheckpointStatus, CourseProgressService, CourseSession, NavigationOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use training_core::model::QuestionKind;
use training_core::tracker::{Position, Transition};

/// One line of input during `take`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkCommand {
    Answer(String),
    Next,
    Previous,
    Save,
    Quit,
    Help,
}

impl WalkCommand {
    /// `None` for blank or unrecognised input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        match head {
            "a" | "answer" if !rest.trim().is_empty() => {
                Some(Self::Answer(rest.trim().to_owned()))
            }
            "n" | "next" => Some(Self::Next),
            "p" | "prev" => Some(Self::Previous),
            "s" | "save" => Some(Self::Save),
            "q" | "quit" => Some(Self::Quit),
            "h" | "help" | "?" => Some(Self::Help),
            _ => None,
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  a <value>   answer the current question");
    println!("  n           next question");
    println!("  p           previous question");
    println!("  s           save progress now");
    println!("  q           quit");
}

fn print_position(session: &CourseSession) {
    let snap = session.snapshot();
    if snap.completed {
        println!(
            "Course complete: {} of {} answered ({}%).",
            snap.answered, snap.total_questions, snap.percentage
        );
        return;
    }
    let (Some(section), Some(question)) = (session.current_section(), session.current_question())
    else {
        println!("This course has no questions. Press n to finish.");
        return;
    };

    println!();
    println!(
        "[{}/{}] {} ({}% complete)",
        snap.section + 1,
        snap.section_count,
        section.title(),
        snap.percentage
    );
    println!(
        "  Q{}/{}: {}{}",
        snap.question + 1,
        snap.question_count,
        question.text(),
        if question.is_required() { " *" } else { "" }
    );
    match question.kind() {
        QuestionKind::MultipleChoice => {
            for option in question.options() {
                println!("    - {option}");
            }
        }
        QuestionKind::Boolean => println!("    (true / false)"),
        QuestionKind::Text => {}
    }
    if let Some(answer) = session.current_answer() {
        println!("  current answer: {}", answer.as_stored());
    }
}

fn report(outcome: &NavigationOutcome) {
    if let Transition::Completed { at } = outcome.transition {
        println!("Finished at {at}.");
    }
    if let CheckpointStatus::Failed(warning) = &outcome.checkpoint {
        println!("warning: {warning}");
    }
}

async fn navigate(
    progress: &CourseProgressService,
    session: &mut CourseSession,
    forward: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if session.position() == Position::Completed {
        println!("This course is already complete.");
        return Ok(());
    }
    let outcome = if forward {
        progress.advance(session).await?
    } else {
        progress.retreat(session).await?
    };
    report(&outcome);
    print_position(session);
    Ok(())
}

/// Drive a session from stdin until the learner quits or input ends.
pub async fn run(
    progress: &CourseProgressService,
    session: &mut CourseSession,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", session.course().title());
    print_help();
    print_position(session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = WalkCommand::parse(&line) else {
            if !line.trim().is_empty() {
                println!("unknown command: {}", line.trim());
            }
            continue;
        };

        match command {
            WalkCommand::Answer(value) => {
                match progress.record_raw_answer(session, &value) {
                    Ok(()) => println!("recorded."),
                    Err(err) => println!("not recorded: {err}"),
                }
            }
            WalkCommand::Next => navigate(progress, session, true).await?,
            WalkCommand::Previous => navigate(progress, session, false).await?,
            WalkCommand::Save => match progress.save(session).await {
                Ok(record) => println!("saved ({}%).", record.completion_percentage()),
                Err(err) => println!("warning: {err}"),
            },
            WalkCommand::Help => print_help(),
            WalkCommand::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(
            WalkCommand::parse("a Microfibre cloth"),
            Some(WalkCommand::Answer("Microfibre cloth".into()))
        );
        assert_eq!(WalkCommand::parse("  next "), Some(WalkCommand::Next));
        assert_eq!(WalkCommand::parse("p"), Some(WalkCommand::Previous));
        assert_eq!(WalkCommand::parse("q"), Some(WalkCommand::Quit));
    }

    #[test]
    fn answer_needs_a_value() {
        assert_eq!(WalkCommand::parse("a"), None);
        assert_eq!(WalkCommand::parse("a   "), None);
        assert_eq!(WalkCommand::parse("dance"), None);
    }
}
