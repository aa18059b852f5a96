use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::course::{Question, QuestionKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("{expected} question cannot take a {got} answer")]
    KindMismatch {
        expected: QuestionKind,
        got: QuestionKind,
    },

    #[error("expected \"true\" or \"false\", got {0:?}")]
    NotBoolean(String),

    #[error("{0:?} is not one of the question's options")]
    UnknownOption(String),
}

/// A learner's answer, tagged with the kind of question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Answer {
    Text(String),
    Choice(String),
    Bool(bool),
}

impl Answer {
    /// Interpret a raw UI value according to the question's declared type.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::NotBoolean` for a boolean question given anything
    /// but `"true"`/`"false"`, and `AnswerError::UnknownOption` for a choice
    /// outside the question's options.
    pub fn parse(question: &Question, raw: &str) -> Result<Self, AnswerError> {
        let answer = match question.kind() {
            QuestionKind::Text => Answer::Text(raw.to_owned()),
            QuestionKind::MultipleChoice => Answer::Choice(raw.to_owned()),
            QuestionKind::Boolean => match raw.trim() {
                "true" => Answer::Bool(true),
                "false" => Answer::Bool(false),
                other => return Err(AnswerError::NotBoolean(other.to_owned())),
            },
        };
        answer.check(question)?;
        Ok(answer)
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Answer::Text(_) => QuestionKind::Text,
            Answer::Choice(_) => QuestionKind::MultipleChoice,
            Answer::Bool(_) => QuestionKind::Boolean,
        }
    }

    /// Check that this answer fits the question's type and options.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::KindMismatch` or `AnswerError::UnknownOption`.
    pub fn check(&self, question: &Question) -> Result<(), AnswerError> {
        if self.kind() != question.kind() {
            return Err(AnswerError::KindMismatch {
                expected: question.kind(),
                got: self.kind(),
            });
        }
        if let Answer::Choice(choice) = self {
            if !question.options().iter().any(|o| o == choice) {
                return Err(AnswerError::UnknownOption(choice.clone()));
            }
        }
        Ok(())
    }

    /// String form written to the progress store.
    #[must_use]
    pub fn as_stored(&self) -> Cow<'_, str> {
        match self {
            Answer::Text(s) | Answer::Choice(s) => Cow::Borrowed(s.as_str()),
            Answer::Bool(true) => Cow::Borrowed("true"),
            Answer::Bool(false) => Cow::Borrowed("false"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice() -> Question {
        Question::from_persisted(
            "Which cloth for glass?",
            QuestionKind::MultipleChoice,
            vec!["Microfibre".into(), "Paper".into()],
            None,
            true,
        )
    }

    fn boolean() -> Question {
        Question::from_persisted("Ready?", QuestionKind::Boolean, Vec::new(), None, true)
    }

    #[test]
    fn parses_booleans_strictly() {
        assert_eq!(Answer::parse(&boolean(), "true"), Ok(Answer::Bool(true)));
        assert_eq!(Answer::parse(&boolean(), " false "), Ok(Answer::Bool(false)));
        assert_eq!(
            Answer::parse(&boolean(), "yes"),
            Err(AnswerError::NotBoolean("yes".into()))
        );
    }

    #[test]
    fn choice_must_be_an_option() {
        assert!(Answer::parse(&choice(), "Microfibre").is_ok());
        assert_eq!(
            Answer::parse(&choice(), "Sponge"),
            Err(AnswerError::UnknownOption("Sponge".into()))
        );
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let err = Answer::Text("hi".into()).check(&boolean()).unwrap_err();
        assert_eq!(
            err,
            AnswerError::KindMismatch {
                expected: QuestionKind::Boolean,
                got: QuestionKind::Text
            }
        );
    }

    #[test]
    fn stored_form_is_plain_string() {
        assert_eq!(Answer::Bool(true).as_stored(), "true");
        assert_eq!(Answer::Choice("Paper".into()).as_stored(), "Paper");
    }
}
