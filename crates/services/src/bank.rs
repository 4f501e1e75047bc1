use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use quiz_core::model::{AnswerIndex, Question, QuestionId};

use crate::error::BankError;

/// On-disk shape of a bank file: a list of `[[questions]]` tables.
#[derive(Debug, Deserialize)]
struct BankFile {
    questions: Vec<Question>,
}

/// Fixed, ordered set of questions shared by every session.
///
/// Cloning is cheap; the questions themselves live behind an `Arc` and are
/// never mutated. Each new session receives its own copy via `snapshot`.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Arc<[Question]>,
}

impl QuestionBank {
    /// Wrap `questions` as-is, without validation.
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into(),
        }
    }

    /// Wrap `questions` after checking ids and each question's shape.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` or `BankError::Question`.
    pub fn validated(questions: Vec<Question>) -> Result<Self, BankError> {
        let bank = Self::new(questions);
        bank.validate()?;
        Ok(bank)
    }

    /// Parse a bank from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Parse` for malformed input, and validation errors
    /// when `validate` is set.
    pub fn from_toml_str(raw: &str, validate: bool) -> Result<Self, BankError> {
        let file: BankFile = toml::from_str(raw)?;
        if validate {
            Self::validated(file.questions)
        } else {
            Ok(Self::new(file.questions))
        }
    }

    /// Read and parse a bank file.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Io` if the file cannot be read, otherwise as
    /// [`QuestionBank::from_toml_str`].
    pub fn from_toml_file(path: &Path, validate: bool) -> Result<Self, BankError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, validate)
    }

    /// Check that ids are unique and every question is well formed.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in bank order.
    pub fn validate(&self) -> Result<(), BankError> {
        let mut seen = HashSet::with_capacity(self.questions.len());
        for question in self.questions.iter() {
            if !seen.insert(question.id()) {
                return Err(BankError::DuplicateId(question.id()));
            }
            question.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Independent copy of the questions for a new session.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Question> {
        self.questions.to_vec()
    }

    /// The reference ten-question bank (ids 1 through 10).
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            builtin_question(
                1,
                "What does JVM stand for?",
                &[
                    "Java Virtual Machine",
                    "Java Variable Method",
                    "Java Version Manager",
                    "Java Visual Mode",
                ],
                0,
                "Java",
            ),
            builtin_question(
                2,
                "Which keyword is used for inheritance in Java?",
                &["implements", "inherits", "extends", "derive"],
                2,
                "Java",
            ),
            builtin_question(
                3,
                "What is the default value of a boolean variable in Java?",
                &["true", "false", "0", "null"],
                1,
                "Java",
            ),
            builtin_question(
                4,
                "Which collection allows duplicate elements?",
                &["Set", "List", "Map", "Queue"],
                1,
                "Java",
            ),
            builtin_question(
                5,
                "What is encapsulation in OOP?",
                &[
                    "Hiding implementation details",
                    "Multiple inheritance",
                    "Method overloading",
                    "Interface implementation",
                ],
                0,
                "OOP",
            ),
            builtin_question(
                6,
                "Which access modifier provides the most restricted access?",
                &["public", "protected", "default", "private"],
                3,
                "Java",
            ),
            builtin_question(
                7,
                "What is polymorphism?",
                &["Single form", "Many forms", "No form", "Two forms"],
                1,
                "OOP",
            ),
            builtin_question(
                8,
                "Which loop is guaranteed to execute at least once?",
                &["for", "while", "do-while", "foreach"],
                2,
                "Java",
            ),
            builtin_question(
                9,
                "What does API stand for?",
                &[
                    "Application Programming Interface",
                    "Advanced Programming Interface",
                    "Application Protocol Interface",
                    "Automated Programming Interface",
                ],
                0,
                "General",
            ),
            builtin_question(
                10,
                "Which design pattern ensures a class has only one instance?",
                &["Factory", "Singleton", "Observer", "Strategy"],
                1,
                "Design Patterns",
            ),
        ])
    }
}

fn builtin_question(
    id: u32,
    text: &str,
    options: &[&str],
    correct: AnswerIndex,
    category: &str,
) -> Question {
    Question::new(
        QuestionId::new(id),
        text,
        options.iter().map(|o| (*o).to_string()).collect(),
        correct,
    )
    .with_category(category)
}
