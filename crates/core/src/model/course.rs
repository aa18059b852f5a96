use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::answer::{Answer, AnswerError};
use crate::model::ids::{CourseId, QuestionKey};

/// Standard categories offered in the course catalog.
pub const COURSE_CATEGORIES: [&str; 5] = [
    "Post Construction Cleaning",
    "Office Cleaning",
    "Childcare Cleaning",
    "School Cleaning",
    "Customer Service Cleaning",
];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course description cannot be empty")]
    EmptyDescription,

    #[error("course category cannot be empty")]
    EmptyCategory,

    #[error("invalid image URL: {0}")]
    InvalidImageUrl(String),

    #[error("course must have at least one section")]
    NoSections,

    #[error("section order must be a zero-based contiguous sequence")]
    NonContiguousOrder,

    #[error("section {section} must have a title")]
    EmptySectionTitle { section: usize },

    #[error("section {section} must have at least one question")]
    NoQuestions { section: usize },

    #[error("question {key} must have text")]
    EmptyQuestionText { key: QuestionKey },

    #[error("multiple choice question {key} must have at least two options")]
    TooFewOptions { key: QuestionKey },

    #[error("question {key} has an empty option")]
    EmptyOption { key: QuestionKey },

    #[error("question {key} lists the same option twice")]
    DuplicateOption { key: QuestionKey },

    #[error("question {key} has an invalid correct answer: {source}")]
    InvalidCorrectAnswer {
        key: QuestionKey,
        #[source]
        source: AnswerError,
    },

    #[error("unknown question type: {0}")]
    UnknownQuestionKind(String),

    #[error("unknown course status: {0}")]
    UnknownStatus(String),
}

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

/// Declared input type of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Text,
    MultipleChoice,
    Boolean,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(QuestionKind::Text),
            "multiple-choice" => Ok(QuestionKind::MultipleChoice),
            "boolean" => Ok(QuestionKind::Boolean),
            other => Err(CourseError::UnknownQuestionKind(other.to_owned())),
        }
    }
}

/// Whether the course is offered to learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Active,
    Inactive,
}

impl CourseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CourseStatus::Active => "active",
            CourseStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for CourseStatus {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CourseStatus::Active),
            "inactive" => Ok(CourseStatus::Inactive),
            other => Err(CourseError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── QUESTION / SECTION ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    kind: QuestionKind,
    options: Vec<String>,
    correct_answer: Option<String>,
    required: bool,
}

impl Question {
    /// Rehydrate a question from storage without authoring checks.
    #[must_use]
    pub fn from_persisted(
        text: impl Into<String>,
        kind: QuestionKind,
        options: Vec<String>,
        correct_answer: Option<String>,
        required: bool,
    ) -> Self {
        Self {
            text: text.into(),
            kind,
            options,
            correct_answer,
            required,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> Option<&str> {
        self.correct_answer.as_deref()
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    title: String,
    description: String,
    order: u32,
    questions: Vec<Question>,
}

impl Section {
    #[must_use]
    pub fn from_persisted(
        title: impl Into<String>,
        description: impl Into<String>,
        order: u32,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            order,
            questions,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A training course: metadata plus an ordered sequence of sections.
///
/// Sections are always held sorted by their `order`, which is guaranteed to be
/// `0..sections.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    category: String,
    image_url: Option<String>,
    status: CourseStatus,
    sections: Vec<Section>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Course {
    /// Rehydrate a course from storage.
    ///
    /// Only the structural invariant is enforced here (contiguous section
    /// order). Authoring rules such as "every section has a question" belong
    /// to [`CourseDraft::validate`].
    ///
    /// # Errors
    ///
    /// Returns `CourseError::NonContiguousOrder` if the section order values
    /// are not exactly `0..n`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        image_url: Option<String>,
        status: CourseStatus,
        mut sections: Vec<Section>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        sections.sort_by_key(Section::order);
        ensure_contiguous(sections.iter().map(Section::order))?;

        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            image_url,
            status,
            sections,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> CourseStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == CourseStatus::Active
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn question(&self, key: QuestionKey) -> Option<&Question> {
        self.sections.get(key.section)?.questions.get(key.question)
    }

    /// Sum of question counts across all sections.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(Section::question_count).sum()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn with_status(mut self, status: CourseStatus, updated_at: DateTime<Utc>) -> Self {
        self.status = status;
        self.updated_at = updated_at;
        self
    }

    /// Case-insensitive match over title, description and category.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.category.to_lowercase().contains(&term)
    }
}

fn ensure_contiguous(orders: impl Iterator<Item = u32>) -> Result<(), CourseError> {
    for (expected, order) in orders.enumerate() {
        if usize::try_from(order).ok() != Some(expected) {
            return Err(CourseError::NonContiguousOrder);
        }
    }
    Ok(())
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub correct_answer: Option<String>,
    pub required: bool,
}

impl QuestionDraft {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: QuestionKind::Text,
            options: Vec::new(),
            correct_answer: None,
            required: true,
        }
    }

    #[must_use]
    pub fn boolean(text: impl Into<String>) -> Self {
        Self {
            kind: QuestionKind::Boolean,
            ..Self::text(text)
        }
    }

    #[must_use]
    pub fn multiple_choice<I, S>(text: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: QuestionKind::MultipleChoice,
            options: options.into_iter().map(Into::into).collect(),
            ..Self::text(text)
        }
    }

    #[must_use]
    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDraft {
    pub title: String,
    pub description: String,
    pub order: u32,
    pub questions: Vec<QuestionDraft>,
}

impl SectionDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, order: u32, questions: Vec<QuestionDraft>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            order,
            questions,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Authoring form for a course; `validate` applies every authoring rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub status: CourseStatus,
    pub sections: Vec<SectionDraft>,
}

impl CourseDraft {
    /// The template a new course starts from: one introduction section with a
    /// single readiness question.
    #[must_use]
    pub fn starter() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            image_url: None,
            status: CourseStatus::Active,
            sections: vec![
                SectionDraft::new(
                    "Introduction",
                    0,
                    vec![QuestionDraft::boolean("Are you ready to begin?")],
                )
                .with_description("Welcome to the course"),
            ],
        }
    }

    /// Build a draft from an existing course, e.g. to edit it.
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            description: course.description.clone(),
            category: course.category.clone(),
            image_url: course.image_url.clone(),
            status: course.status,
            sections: course
                .sections
                .iter()
                .map(|s| SectionDraft {
                    title: s.title.clone(),
                    description: s.description.clone(),
                    order: s.order,
                    questions: s
                        .questions
                        .iter()
                        .map(|q| QuestionDraft {
                            text: q.text.clone(),
                            kind: q.kind,
                            options: q.options.clone(),
                            correct_answer: q.correct_answer.clone(),
                            required: q.required,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns the first `CourseError` found, checking course fields first,
    /// then sections in order, then their questions.
    pub fn validate(self) -> Result<ValidatedCourse, CourseError> {
        let title = self.title.trim().to_owned();
        let description = self.description.trim().to_owned();
        let category = self.category.trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if description.is_empty() {
            return Err(CourseError::EmptyDescription);
        }
        if category.is_empty() {
            return Err(CourseError::EmptyCategory);
        }

        let image_url = match self.image_url.map(|u| u.trim().to_owned()) {
            Some(u) if u.is_empty() => None,
            Some(u) => {
                Url::parse(&u).map_err(|_| CourseError::InvalidImageUrl(u.clone()))?;
                Some(u)
            }
            None => None,
        };

        if self.sections.is_empty() {
            return Err(CourseError::NoSections);
        }

        let mut drafts = self.sections;
        drafts.sort_by_key(|s| s.order);
        ensure_contiguous(drafts.iter().map(|s| s.order))?;

        let mut sections = Vec::with_capacity(drafts.len());
        for (section_idx, draft) in drafts.into_iter().enumerate() {
            sections.push(validate_section(section_idx, draft)?);
        }

        Ok(ValidatedCourse {
            title,
            description,
            category,
            image_url,
            status: self.status,
            sections,
        })
    }
}

fn validate_section(section_idx: usize, draft: SectionDraft) -> Result<Section, CourseError> {
    let title = draft.title.trim().to_owned();
    if title.is_empty() {
        return Err(CourseError::EmptySectionTitle {
            section: section_idx,
        });
    }
    if draft.questions.is_empty() {
        return Err(CourseError::NoQuestions {
            section: section_idx,
        });
    }

    let mut questions = Vec::with_capacity(draft.questions.len());
    for (question_idx, q) in draft.questions.into_iter().enumerate() {
        let key = QuestionKey::new(section_idx, question_idx);
        let text = q.text.trim().to_owned();
        if text.is_empty() {
            return Err(CourseError::EmptyQuestionText { key });
        }

        // Options only mean something for multiple choice; drop leftovers from
        // a question whose type was switched while editing.
        let options = if q.kind == QuestionKind::MultipleChoice {
            if q.options.len() < 2 {
                return Err(CourseError::TooFewOptions { key });
            }
            let options: Vec<String> = q.options.iter().map(|o| o.trim().to_owned()).collect();
            if options.iter().any(String::is_empty) {
                return Err(CourseError::EmptyOption { key });
            }
            let mut seen = HashSet::with_capacity(options.len());
            if !options.iter().all(|o| seen.insert(o.as_str())) {
                return Err(CourseError::DuplicateOption { key });
            }
            options
        } else {
            Vec::new()
        };

        let mut question = Question {
            text,
            kind: q.kind,
            options,
            correct_answer: None,
            required: q.required,
        };
        if let Some(raw) = q.correct_answer.filter(|a| !a.trim().is_empty()) {
            let answer = Answer::parse(&question, &raw)
                .map_err(|source| CourseError::InvalidCorrectAnswer { key, source })?;
            question.correct_answer = Some(answer.as_stored().into_owned());
        }
        questions.push(question);
    }

    Ok(Section {
        title,
        description: draft.description.trim().to_owned(),
        order: draft.order,
        questions,
    })
}

/// A course that passed authoring validation but has not been assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCourse {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub status: CourseStatus,
    pub sections: Vec<Section>,
}

impl ValidatedCourse {
    #[must_use]
    pub fn assign_id(
        self,
        id: CourseId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Course {
        Course {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
            status: self.status,
            sections: self.sections,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft() -> CourseDraft {
        CourseDraft {
            title: "Office Basics".into(),
            description: "Cleaning an office floor".into(),
            category: COURSE_CATEGORIES[1].into(),
            image_url: None,
            status: CourseStatus::Active,
            sections: vec![
                SectionDraft::new(
                    "Safety",
                    0,
                    vec![
                        QuestionDraft::boolean("Wear gloves?").with_correct_answer("true"),
                        QuestionDraft::multiple_choice("Pick a mop", ["Flat", "String"]),
                    ],
                ),
                SectionDraft::new("Wrap up", 1, vec![QuestionDraft::text("Any notes?")]),
            ],
        }
    }

    #[test]
    fn valid_draft_builds_course() {
        let now = fixed_now();
        let course = draft().validate().unwrap().assign_id(CourseId::new(3), now, now);
        assert_eq!(course.section_count(), 2);
        assert_eq!(course.total_questions(), 3);
        assert_eq!(
            course.question(QuestionKey::new(0, 0)).unwrap().correct_answer(),
            Some("true")
        );
        assert!(course.question(QuestionKey::new(1, 1)).is_none());
    }

    #[test]
    fn starter_template_is_incomplete_until_metadata_is_filled() {
        assert_eq!(CourseDraft::starter().validate(), Err(CourseError::EmptyTitle));

        let mut d = CourseDraft::starter();
        d.title = "Intro".into();
        d.description = "First steps".into();
        d.category = COURSE_CATEGORIES[0].into();
        let v = d.validate().unwrap();
        assert_eq!(v.sections[0].questions()[0].kind(), QuestionKind::Boolean);
    }

    #[test]
    fn rejects_section_without_questions() {
        let mut d = draft();
        d.sections[1].questions.clear();
        assert_eq!(d.validate(), Err(CourseError::NoQuestions { section: 1 }));
    }

    #[test]
    fn rejects_multiple_choice_with_one_option() {
        let mut d = draft();
        d.sections[0].questions[1].options.truncate(1);
        assert_eq!(
            d.validate(),
            Err(CourseError::TooFewOptions {
                key: QuestionKey::new(0, 1)
            })
        );
    }

    #[test]
    fn rejects_repeated_option() {
        let mut d = draft();
        d.sections[0].questions[1] = QuestionDraft::multiple_choice("Pick a mop", ["Mop", " Mop "]);
        assert_eq!(
            d.validate(),
            Err(CourseError::DuplicateOption {
                key: QuestionKey::new(0, 1)
            })
        );

        let mut d = draft();
        d.sections[0].questions[1] = QuestionDraft::multiple_choice("Pick", ["Mop", "Mop"]);
        assert!(d.validate().is_err());
    }

    #[test]
    fn options_are_trimmed() {
        let mut d = draft();
        d.sections[0].questions[1] =
            QuestionDraft::multiple_choice("Pick a mop", [" Flat", "String "]).with_correct_answer("Flat");
        let v = d.validate().unwrap();
        assert_eq!(v.sections[0].questions()[1].options(), ["Flat", "String"]);
    }

    #[test]
    fn rejects_gap_in_section_order() {
        let mut d = draft();
        d.sections[1].order = 2;
        assert_eq!(d.validate(), Err(CourseError::NonContiguousOrder));
    }

    #[test]
    fn sorts_sections_by_order() {
        let mut d = draft();
        d.sections.swap(0, 1);
        d.sections[0].order = 1;
        d.sections[1].order = 0;
        let v = d.validate().unwrap();
        assert_eq!(v.sections[0].title(), "Safety");
    }

    #[test]
    fn rejects_bad_image_url() {
        let mut d = draft();
        d.image_url = Some("not a url".into());
        assert!(matches!(d.validate(), Err(CourseError::InvalidImageUrl(_))));
    }

    #[test]
    fn rejects_correct_answer_outside_options() {
        let mut d = draft();
        d.sections[0].questions[1].correct_answer = Some("Broom".into());
        assert!(matches!(
            d.validate(),
            Err(CourseError::InvalidCorrectAnswer { .. })
        ));
    }

    #[test]
    fn options_are_dropped_for_non_choice_questions() {
        let mut d = draft();
        d.sections[1].questions[0].options = vec!["stale".into()];
        let v = d.validate().unwrap();
        assert!(v.sections[1].questions()[0].options().is_empty());
    }

    #[test]
    fn persisted_course_may_have_no_sections() {
        let now = fixed_now();
        let course = Course::from_persisted(
            CourseId::new(1),
            "Empty",
            "",
            "",
            None,
            CourseStatus::Inactive,
            Vec::new(),
            now,
            now,
        )
        .unwrap();
        assert_eq!(course.total_questions(), 0);
    }

    #[test]
    fn search_is_case_insensitive() {
        let now = fixed_now();
        let course = draft().validate().unwrap().assign_id(CourseId::new(1), now, now);
        assert!(course.matches_search("office"));
        assert!(course.matches_search("FLOOR"));
        assert!(!course.matches_search("childcare"));
    }

    #[test]
    fn round_trips_through_draft() {
        let now = fixed_now();
        let course = draft().validate().unwrap().assign_id(CourseId::new(9), now, now);
        let again = CourseDraft::from_course(&course)
            .validate()
            .unwrap()
            .assign_id(CourseId::new(9), now, now);
        assert_eq!(course, again);
    }
}
