use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AnswerIndex, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Problems detected when a question is checked at bank load time.
///
/// Scoring never raises these; see [`Question::is_correct`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has empty text")]
    EmptyText { id: QuestionId },

    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} marks option {index} as correct but has {len} options")]
    CorrectIndexOutOfRange {
        id: QuestionId,
        index: AnswerIndex,
        len: usize,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

pub const DEFAULT_CATEGORY: &str = "General";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A single multiple-choice item.
///
/// Built once as part of a question bank and never mutated afterwards;
/// sessions hold their own copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    #[serde(rename = "correct")]
    correct_index: AnswerIndex,
    #[serde(default = "default_category")]
    category: String,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: AnswerIndex,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            options,
            correct_index,
            category: default_category(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> AnswerIndex {
        self.correct_index
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns true when `answer` is the designated correct option.
    ///
    /// No range checks: a negative or out-of-range answer is simply wrong.
    #[must_use]
    pub fn is_correct(&self, answer: AnswerIndex) -> bool {
        answer == self.correct_index
    }

    /// Option text at `index`, if the index addresses an option.
    #[must_use]
    pub fn option(&self, index: AnswerIndex) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }

    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.option(self.correct_index)
    }

    /// Check the question is well formed.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for empty text, no options, or a correct index
    /// that does not address an option.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText { id: self.id });
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions { id: self.id });
        }
        if self.correct_option().is_none() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                id: self.id,
                index: self.correct_index,
                len: self.options.len(),
            });
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn jvm_question() -> Question {
        Question::new(
            QuestionId::new(1),
            "What does JVM stand for?",
            vec![
                "Java Virtual Machine".into(),
                "Java Variable Method".into(),
                "Java Version Manager".into(),
                "Java Visual Mode".into(),
            ],
            0,
        )
    }

    #[test]
    fn correct_answer_matches() {
        let q = jvm_question();
        assert!(q.is_correct(0));
        assert!(!q.is_correct(1));
        assert!(!q.is_correct(3));
    }

    #[test]
    fn out_of_range_answers_are_never_correct() {
        let q = jvm_question();
        assert!(!q.is_correct(-1));
        assert!(!q.is_correct(4));
        assert!(!q.is_correct(AnswerIndex::MAX));
    }

    #[test]
    fn out_of_range_correct_index_never_matches_a_real_option() {
        let q = Question::new(QuestionId::new(2), "Broken", vec!["a".into()], 5);
        assert!(!q.is_correct(0));
        assert_eq!(q.correct_option(), None);
    }

    #[test]
    fn option_lookup_tolerates_bad_indices() {
        let q = jvm_question();
        assert_eq!(q.option(2), Some("Java Version Manager"));
        assert_eq!(q.option(-3), None);
        assert_eq!(q.option(9), None);
        assert_eq!(q.correct_option(), Some("Java Virtual Machine"));
    }

    #[test]
    fn category_defaults_to_general() {
        assert_eq!(jvm_question().category(), DEFAULT_CATEGORY);
        let q = jvm_question().with_category("JVM");
        assert_eq!(q.category(), "JVM");
    }

    #[test]
    fn validate_flags_each_problem() {
        assert!(jvm_question().validate().is_ok());

        let empty_text = Question::new(QuestionId::new(3), "  ", vec!["a".into()], 0);
        assert_eq!(
            empty_text.validate(),
            Err(QuestionError::EmptyText {
                id: QuestionId::new(3)
            })
        );

        let no_options = Question::new(QuestionId::new(4), "Q", Vec::new(), 0);
        assert_eq!(
            no_options.validate(),
            Err(QuestionError::NoOptions {
                id: QuestionId::new(4)
            })
        );

        let bad_index = Question::new(QuestionId::new(5), "Q", vec!["a".into()], -1);
        assert!(matches!(
            bad_index.validate(),
            Err(QuestionError::CorrectIndexOutOfRange { index: -1, len: 1, .. })
        ));
    }

    #[test]
    fn deserializes_with_default_category() {
        let json = r#"{"id":9,"text":"Q","options":["x","y"],"correct":1}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id(), QuestionId::new(9));
        assert_eq!(q.correct_index(), 1);
        assert_eq!(q.category(), DEFAULT_CATEGORY);
    }
}
