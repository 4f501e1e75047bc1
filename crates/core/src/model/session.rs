use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::model::ids::{AnswerIndex, QuestionId, SessionId};
use crate::model::question::Question;
use crate::model::report::{
    CategoryScore, LetterGrade, QuestionResult, ScoreReport, round_one_decimal, tally_categories,
};

//
// ─── STATE MACHINE ─────────────────────────────────────────────────────────────
//

/// Observable phase of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not completed and not yet on the final question.
    InProgress,
    /// The next advance completes the session. Also reported for an empty
    /// session and for a cursor moved past the end.
    AtLastQuestion,
    /// Terminal.
    Completed,
}

/// Result of [`QuizSession::advance`].
///
/// A single call either moves to the next question or, when none remain,
/// finishes the session. Callers branch on the variant to decide whether to
/// show another question or the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Advance {
    Advanced,
    Completed,
}

impl Advance {
    #[must_use]
    pub fn is_advanced(self) -> bool {
        matches!(self, Self::Advanced)
    }
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// One-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// Whole-number share of questions already moved past.
    pub percent_through: u32,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's run through a question bank.
///
/// Holds a private copy of the questions, the submitted answers keyed by
/// question id, and a cursor into the question list. The session itself does
/// not refuse answers once completed; that gate belongs to whoever owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    id: SessionId,
    owner_name: String,
    questions: Vec<Question>,
    answers: HashMap<QuestionId, AnswerIndex>,
    current: usize,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a fresh session positioned on the first question.
    ///
    /// `started_at` should come from the services layer clock.
    #[must_use]
    pub fn new(
        id: SessionId,
        owner_name: impl Into<String>,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_name: owner_name.into(),
            questions,
            answers: HashMap::new(),
            current: 0,
            started_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, AnswerIndex> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<AnswerIndex> {
        self.answers.get(&question_id).copied()
    }

    #[must_use]
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.answers.contains_key(&question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Zero-based index of the current question.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Move the cursor without any checks.
    ///
    /// An index past the end is tolerated; `current_question` then returns
    /// `None`.
    pub fn set_current_index(&mut self, index: usize) {
        self.current = index;
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_complete() {
            SessionState::Completed
        } else if self.current >= self.last_index() {
            SessionState::AtLastQuestion
        } else {
            SessionState::InProgress
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Record `answer` for `question_id`, replacing any earlier answer.
    ///
    /// Pure storage: the id is not checked against this session's questions.
    pub fn submit_answer(&mut self, question_id: QuestionId, answer: AnswerIndex) {
        self.answers.insert(question_id, answer);
    }

    /// Move to the next question, or complete the session if there is none.
    ///
    /// Completion stamps `completed_at` with `now` the first time only.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Advance {
        if self.current < self.last_index() {
            self.current += 1;
            Advance::Advanced
        } else {
            self.mark_completed(now);
            Advance::Completed
        }
    }

    fn last_index(&self) -> usize {
        self.questions.len().saturating_sub(1)
    }

    /// Force the session into the completed state. Idempotent.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }

    /// Number of questions whose recorded answer is correct.
    #[must_use]
    pub fn score(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answer_for(q.id()).is_some_and(|a| q.is_correct(a)))
            .count()
    }

    /// Score as a percentage in `0.0..=100.0`; `0.0` for an empty session.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let pct = 100.0 * self.score() as f64 / self.questions.len() as f64;
        pct
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total_questions();
        let percent_through = if total == 0 {
            0
        } else {
            #[allow(
                clippy::cast_precision_loss,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss
            )]
            let pct = (self.current as f64 * 100.0 / total as f64).round() as u32;
            pct
        };
        SessionProgress {
            position: self.current.saturating_add(1),
            total,
            answered: self.answered_count(),
            percent_through,
            is_complete: self.is_complete(),
        }
    }

    /// Time spent so far, frozen once the session completes.
    #[must_use]
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        self.completed_at.unwrap_or(now) - self.started_at
    }

    #[must_use]
    pub fn question_results(&self) -> Vec<QuestionResult> {
        self.questions
            .iter()
            .map(|q| QuestionResult::new(q, self.answer_for(q.id())))
            .collect()
    }

    #[must_use]
    pub fn category_scores(&self) -> BTreeMap<String, CategoryScore> {
        tally_categories(&self.question_results())
    }

    #[must_use]
    pub fn report(&self, now: DateTime<Utc>) -> ScoreReport {
        let categories = self.category_scores();
        let results = self.question_results();
        let correct = self.score();
        let total = self.total_questions();
        let percentage = self.percentage();
        ScoreReport {
            owner_name: self.owner_name.clone(),
            total,
            correct,
            incorrect: total - correct,
            percentage: round_one_decimal(percentage),
            grade: LetterGrade::from_percentage(percentage),
            completed: self.is_complete(),
            duration_secs: self.duration(now).num_seconds(),
            categories,
            results,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn question(id: u32, correct: AnswerIndex) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into()],
            correct,
        )
    }

    /// Three questions whose correct answers are `[0, 0, 1]`.
    fn three_question_session() -> QuizSession {
        QuizSession::new(
            SessionId::generate(),
            "Ada",
            vec![question(1, 0), question(2, 0), question(3, 1)],
            fixed_now(),
        )
    }

    #[test]
    fn fresh_session_starts_on_first_question() {
        let session = three_question_session();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.current_question().map(Question::id), Some(QuestionId::new(1)));
        assert_eq!(session.state(), SessionState::InProgress);
        assert!(!session.is_complete());
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn all_correct_walkthrough() {
        let mut session = three_question_session();
        let now = fixed_now();

        session.submit_answer(QuestionId::new(1), 0);
        assert_eq!(session.advance(now), Advance::Advanced);
        assert_eq!(session.current_index(), 1);

        session.submit_answer(QuestionId::new(2), 0);
        assert_eq!(session.advance(now), Advance::Advanced);
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.state(), SessionState::AtLastQuestion);

        session.submit_answer(QuestionId::new(3), 1);
        assert_eq!(session.advance(now), Advance::Completed);
        assert!(session.is_complete());
        assert_eq!(session.state(), SessionState::Completed);

        assert_eq!(session.score(), 3);
        assert!((session.percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_wrong_scores_zero() {
        let mut session = three_question_session();
        session.submit_answer(QuestionId::new(1), 1);
        session.submit_answer(QuestionId::new(2), 1);
        session.submit_answer(QuestionId::new(3), 0);
        assert_eq!(session.score(), 0);
        assert!(session.percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn advance_returns_advanced_len_minus_one_times() {
        let mut session = three_question_session();
        let len = session.total_questions();
        for _ in 0..len - 1 {
            assert!(session.advance(fixed_now()).is_advanced());
            assert!(!session.is_complete());
        }
        assert!(!session.advance(fixed_now()).is_advanced());
        assert!(session.is_complete());
    }

    #[test]
    fn later_submission_overwrites_earlier_one() {
        let mut session = three_question_session();
        session.submit_answer(QuestionId::new(1), 2);
        session.submit_answer(QuestionId::new(1), 0);
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.answer_for(QuestionId::new(1)), Some(0));
    }

    #[test]
    fn unknown_question_ids_are_stored_but_never_score() {
        let mut session = three_question_session();
        session.submit_answer(QuestionId::new(99), 0);
        assert!(session.is_answered(QuestionId::new(99)));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn out_of_range_answers_never_score() {
        let mut session = three_question_session();
        session.submit_answer(QuestionId::new(1), -1);
        session.submit_answer(QuestionId::new(2), 42);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn empty_session_is_safe() {
        let mut session = QuizSession::new(SessionId::generate(), "Nobody", Vec::new(), fixed_now());
        assert_eq!(session.current_question(), None);
        assert_eq!(session.score(), 0);
        assert!(session.percentage().abs() < f64::EPSILON);
        assert_eq!(session.progress().percent_through, 0);
        assert_eq!(session.state(), SessionState::AtLastQuestion);
        assert_eq!(session.advance(fixed_now()), Advance::Completed);
        assert_eq!(session.state(), SessionState::Completed);
        assert!(session.is_complete());
    }

    #[test]
    fn out_of_range_cursor_yields_no_question() {
        let mut session = three_question_session();
        session.set_current_index(3);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.state(), SessionState::AtLastQuestion);

        session.set_current_index(usize::MAX);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.state(), SessionState::AtLastQuestion);
        assert_eq!(session.progress().position, usize::MAX);
        assert_eq!(session.advance(fixed_now()), Advance::Completed);
        assert_eq!(session.current_index(), usize::MAX);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn category_scores_match_report_breakdown() {
        let mut session = QuizSession::new(
            SessionId::generate(),
            "Ada",
            vec![
                question(1, 0).with_category("Java"),
                question(2, 0).with_category("Java"),
                question(3, 1),
            ],
            fixed_now(),
        );
        session.submit_answer(QuestionId::new(1), 0);
        session.submit_answer(QuestionId::new(3), 1);

        let scores = session.category_scores();
        assert_eq!(scores["Java"], CategoryScore { total: 2, correct: 1 });
        assert_eq!(scores["General"], CategoryScore { total: 1, correct: 1 });
        assert_eq!(session.report(fixed_now()).categories, scores);
    }

    #[test]
    fn mark_completed_keeps_first_timestamp() {
        let mut session = three_question_session();
        let first = fixed_now();
        session.mark_completed(first);
        session.mark_completed(first + Duration::seconds(30));
        assert_eq!(session.completed_at(), Some(first));
    }

    #[test]
    fn duration_freezes_at_completion() {
        let mut session = three_question_session();
        let start = fixed_now();
        assert_eq!(session.duration(start + Duration::seconds(5)).num_seconds(), 5);
        session.mark_completed(start + Duration::seconds(65));
        assert_eq!(session.duration(start + Duration::hours(1)).num_seconds(), 65);
    }

    #[test]
    fn progress_tracks_cursor_and_answers() {
        let mut session = three_question_session();
        session.submit_answer(QuestionId::new(1), 0);
        let _ = session.advance(fixed_now());
        let progress = session.progress();
        assert_eq!(progress.position, 2);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.percent_through, 33);
        assert!(!progress.is_complete);
    }

    #[test]
    fn report_summarizes_outcome() {
        let mut session = three_question_session();
        session.submit_answer(QuestionId::new(1), 0);
        session.submit_answer(QuestionId::new(2), 2);
        session.mark_completed(fixed_now() + Duration::seconds(12));

        let report = session.report(fixed_now() + Duration::minutes(10));
        assert_eq!(report.owner_name, "Ada");
        assert_eq!(report.total, 3);
        assert_eq!(report.correct, 1);
        assert_eq!(report.incorrect, 2);
        assert!((report.percentage - 33.3).abs() < f64::EPSILON);
        assert_eq!(report.grade, LetterGrade::F);
        assert!(report.completed);
        assert_eq!(report.duration_secs, 12);
        assert_eq!(report.results.len(), 3);
        assert!(!report.results[2].is_answered());
        assert_eq!(report.categories["General"].total, 3);
    }
}
