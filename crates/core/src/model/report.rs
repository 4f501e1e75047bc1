use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::ids::{AnswerIndex, QuestionId};
use crate::model::question::Question;

//
// ─── LETTER GRADE ──────────────────────────────────────────────────────────────
//

/// Letter grade derived from a percentage score.
///
/// Thresholds: A ≥ 90, B ≥ 80, C ≥ 70, D ≥ 60, otherwise F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::A
        } else if percentage >= 80.0 {
            Self::B
        } else if percentage >= 70.0 {
            Self::C
        } else if percentage >= 60.0 {
            Self::D
        } else {
            Self::F
        }
    }

    /// Short encouragement line shown next to a final score.
    #[must_use]
    pub fn remark(self) -> &'static str {
        match self {
            Self::A => "Outstanding! You have excellent knowledge!",
            Self::B => "Great job! You did very well!",
            Self::C => "Good work! Keep practicing!",
            Self::D => "Not bad, but there's room for improvement.",
            Self::F => "Keep learning and try again!",
        }
    }
}

//
// ─── PER-QUESTION / PER-CATEGORY ───────────────────────────────────────────────
//

/// Outcome for one question of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub text: String,
    pub category: String,
    pub answer: Option<AnswerIndex>,
    pub chosen_option: Option<String>,
    pub correct_option: Option<String>,
    pub is_correct: bool,
}

impl QuestionResult {
    #[must_use]
    pub fn new(question: &Question, answer: Option<AnswerIndex>) -> Self {
        Self {
            question_id: question.id(),
            text: question.text().to_string(),
            category: question.category().to_string(),
            answer,
            chosen_option: answer
                .and_then(|a| question.option(a))
                .map(str::to_string),
            correct_option: question.correct_option().map(str::to_string),
            is_correct: answer.is_some_and(|a| question.is_correct(a)),
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub total: usize,
    pub correct: usize,
}

impl CategoryScore {
    /// Whole-number percentage of correct answers in this category.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = (self.correct as f64 * 100.0 / self.total as f64).round() as u32;
        rounded
    }
}

/// Groups results by category, keeping category names sorted.
#[must_use]
pub fn tally_categories(results: &[QuestionResult]) -> BTreeMap<String, CategoryScore> {
    let mut by_category: BTreeMap<String, CategoryScore> = BTreeMap::new();
    for result in results {
        let entry = by_category.entry(result.category.clone()).or_default();
        entry.total += 1;
        if result.is_correct {
            entry.correct += 1;
        }
    }
    by_category
}

//
// ─── SCORE REPORT ──────────────────────────────────────────────────────────────
//

/// Final (or in-flight) scoring summary for a session.
///
/// `percentage` is rounded to one decimal place; use
/// `QuizSession::percentage` for the exact value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub owner_name: String,
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub percentage: f64,
    pub grade: LetterGrade,
    pub completed: bool,
    pub duration_secs: i64,
    pub categories: BTreeMap<String, CategoryScore>,
    pub results: Vec<QuestionResult>,
}

#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_thresholds() {
        assert_eq!(LetterGrade::from_percentage(100.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(90.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(89.9), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(70.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::D);
        assert_eq!(LetterGrade::from_percentage(59.99), LetterGrade::F);
        assert_eq!(LetterGrade::from_percentage(0.0), LetterGrade::F);
    }

    #[test]
    fn each_grade_has_its_own_remark() {
        let grades = [LetterGrade::A, LetterGrade::B, LetterGrade::C, LetterGrade::D, LetterGrade::F];
        let remarks: std::collections::HashSet<_> = grades.iter().map(|g| g.remark()).collect();
        assert_eq!(remarks.len(), grades.len());
        assert_eq!(LetterGrade::F.remark(), "Keep learning and try again!");
    }

    #[test]
    fn result_for_unanswered_question() {
        let q = Question::new(QuestionId::new(1), "Q", vec!["a".into(), "b".into()], 1);
        let r = QuestionResult::new(&q, None);
        assert!(!r.is_answered());
        assert!(!r.is_correct);
        assert_eq!(r.chosen_option, None);
        assert_eq!(r.correct_option.as_deref(), Some("b"));
    }

    #[test]
    fn result_for_out_of_range_answer() {
        let q = Question::new(QuestionId::new(1), "Q", vec!["a".into()], 0);
        let r = QuestionResult::new(&q, Some(7));
        assert!(r.is_answered());
        assert!(!r.is_correct);
        assert_eq!(r.chosen_option, None);
    }

    #[test]
    fn categories_are_tallied() {
        let web = Question::new(QuestionId::new(1), "Q1", vec!["a".into()], 0).with_category("Web");
        let web2 = Question::new(QuestionId::new(2), "Q2", vec!["a".into()], 0).with_category("Web");
        let db = Question::new(QuestionId::new(3), "Q3", vec!["a".into()], 0).with_category("DB");
        let results = vec![
            QuestionResult::new(&web, Some(0)),
            QuestionResult::new(&web2, Some(1)),
            QuestionResult::new(&db, None),
        ];

        let tally = tally_categories(&results);
        assert_eq!(tally["Web"], CategoryScore { total: 2, correct: 1 });
        assert_eq!(tally["Web"].percent(), 50);
        assert_eq!(tally["DB"].percent(), 0);
        assert_eq!(tally.keys().collect::<Vec<_>>(), vec!["DB", "Web"]);
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        assert!((round_one_decimal(66.666_666) - 66.7).abs() < f64::EPSILON);
        assert!((round_one_decimal(33.333_333) - 33.3).abs() < f64::EPSILON);
    }
}
