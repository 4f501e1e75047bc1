use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{
    Advance, AnswerIndex, QuestionId, QuizSession, ScoreReport, SessionId, SessionProgress,
};

use crate::bank::QuestionBank;

type SessionHandle = Arc<Mutex<QuizSession>>;

//
// ─── ANSWER OUTCOME ────────────────────────────────────────────────────────────
//

/// Result of answering the current question through the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub advance: Advance,
    pub progress: SessionProgress,
    /// Present once the answer finished the session.
    pub report: Option<ScoreReport>,
}

//
// ─── REGISTRY ──────────────────────────────────────────────────────────────────
//

/// Process-wide store of live quiz sessions.
///
/// Sessions are only reachable through the registry. The map lock guards
/// structural changes (create, delete, lookup); each session sits behind its
/// own mutex so work on different sessions never contends and concurrent
/// requests against one session apply one at a time.
///
/// Unknown ids and refused transitions are reported as `None` / `false`.
pub struct SessionRegistry {
    bank: QuestionBank,
    clock: Clock,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(bank: QuestionBank) -> Self {
        Self::with_clock(bank, Clock::system())
    }

    #[must_use]
    pub fn with_clock(bank: QuestionBank, clock: Clock) -> Self {
        Self {
            bank,
            clock,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Start a session for `owner_name` over a fresh copy of the bank.
    ///
    /// The name is stored as given; rejecting blank names is the caller's job.
    pub fn create_session(&self, owner_name: &str) -> SessionId {
        let id = SessionId::generate();
        let session = QuizSession::new(id, owner_name, self.bank.snapshot(), self.clock.now());
        self.write_map().insert(id, Arc::new(Mutex::new(session)));
        info!(
            session_id = %id,
            owner = owner_name,
            questions = self.bank.len(),
            "quiz session created"
        );
        id
    }

    /// Snapshot of the session, or `None` if the id is unknown.
    #[must_use]
    pub fn get_session(&self, id: SessionId) -> Option<QuizSession> {
        self.with_session(id, QuizSession::clone)
    }

    /// Run `f` against the session under its lock without cloning it.
    pub fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&QuizSession) -> R) -> Option<R> {
        let handle = self.handle(id)?;
        let guard = lock_session(&handle);
        Some(f(&guard))
    }

    fn with_session_mut<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut QuizSession) -> R,
    ) -> Option<R> {
        let handle = self.handle(id)?;
        let mut guard = lock_session(&handle);
        Some(f(&mut guard))
    }

    /// Record an answer. Returns `false` for an unknown or completed session.
    pub fn submit_answer(
        &self,
        id: SessionId,
        question_id: QuestionId,
        answer: AnswerIndex,
    ) -> bool {
        let accepted = self.with_session_mut(id, |session| {
            if session.is_complete() {
                return false;
            }
            session.submit_answer(question_id, answer);
            true
        });

        match accepted {
            Some(true) => {
                debug!(session_id = %id, question_id = %question_id, answer, "answer recorded");
                true
            }
            Some(false) => {
                warn!(session_id = %id, question_id = %question_id, "answer rejected: session completed");
                false
            }
            None => {
                debug!(session_id = %id, "submit for unknown session");
                false
            }
        }
    }

    /// Advance the session, returning which branch was taken.
    pub fn try_advance(&self, id: SessionId) -> Option<Advance> {
        let now = self.clock.now();
        let advance = self.with_session_mut(id, |session| {
            let advance = session.advance(now);
            (advance, session.current_index())
        });

        match advance {
            Some((Advance::Advanced, index)) => {
                debug!(session_id = %id, index, "advanced to next question");
                Some(Advance::Advanced)
            }
            Some((Advance::Completed, _)) => {
                info!(session_id = %id, "quiz session completed");
                Some(Advance::Completed)
            }
            None => {
                debug!(session_id = %id, "advance for unknown session");
                None
            }
        }
    }

    /// `true` if the session moved to another question; `false` if it just
    /// completed or does not exist.
    pub fn advance_session(&self, id: SessionId) -> bool {
        self.try_advance(id).is_some_and(Advance::is_advanced)
    }

    /// Force-complete the session and return a snapshot of it. Idempotent.
    pub fn complete_session(&self, id: SessionId) -> Option<QuizSession> {
        let now = self.clock.now();
        let session = self.with_session_mut(id, |session| {
            session.mark_completed(now);
            session.clone()
        })?;
        info!(session_id = %id, score = session.score(), "quiz session marked completed");
        Some(session)
    }

    /// Remove the session. Unknown ids are a no-op; returns whether it existed.
    pub fn delete_session(&self, id: SessionId) -> bool {
        let removed = self.write_map().remove(&id).is_some();
        if removed {
            info!(session_id = %id, "quiz session deleted");
        }
        removed
    }

    /// Point-in-time copy of every session.
    ///
    /// The copy is detached from the registry: mutating it changes nothing,
    /// and sessions created or deleted afterwards do not show up in it.
    #[must_use]
    pub fn all_sessions(&self) -> HashMap<SessionId, QuizSession> {
        let handles: Vec<(SessionId, SessionHandle)> = self
            .read_map()
            .iter()
            .map(|(id, handle)| (*id, Arc::clone(handle)))
            .collect();

        handles
            .into_iter()
            .map(|(id, handle)| (id, lock_session(&handle).clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.read_map().contains_key(&id)
    }

    #[must_use]
    pub fn progress(&self, id: SessionId) -> Option<SessionProgress> {
        self.with_session(id, QuizSession::progress)
    }

    #[must_use]
    pub fn report(&self, id: SessionId) -> Option<ScoreReport> {
        let now = self.clock.now();
        self.with_session(id, |session| session.report(now))
    }

    /// Answer whatever question the session is on, then advance.
    ///
    /// Both steps happen under one lock. Returns `None` if the session is
    /// unknown, already completed, or its cursor points at no question.
    pub fn answer_current(&self, id: SessionId, answer: AnswerIndex) -> Option<AnswerOutcome> {
        let now = self.clock.now();
        let outcome = self.with_session_mut(id, |session| {
            if session.is_complete() {
                return None;
            }
            let question = session.current_question()?;
            let question_id = question.id();
            let is_correct = question.is_correct(answer);

            session.submit_answer(question_id, answer);
            let advance = session.advance(now);
            let report = match advance {
                Advance::Advanced => None,
                Advance::Completed => Some(session.report(now)),
            };

            Some(AnswerOutcome {
                question_id,
                is_correct,
                advance,
                progress: session.progress(),
                report,
            })
        });

        match &outcome {
            Some(Some(answered)) => {
                debug!(
                    session_id = %id,
                    question_id = %answered.question_id,
                    correct = answered.is_correct,
                    "current question answered"
                );
                if let Some(report) = &answered.report {
                    info!(
                        session_id = %id,
                        score = report.correct,
                        total = report.total,
                        "quiz session completed"
                    );
                }
            }
            Some(None) => warn!(session_id = %id, "answer rejected: no open question"),
            None => debug!(session_id = %id, "answer for unknown session"),
        }

        outcome.flatten()
    }

    fn handle(&self, id: SessionId) -> Option<SessionHandle> {
        self.read_map().get(&id).cloned()
    }

    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SessionHandle>> {
        self.sessions.read().unwrap_or_else(|poisoned| {
            warn!("session map lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, SessionHandle>> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            warn!("session map lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

// Session state is plain data with no half-applied updates, so a poisoned
// lock still guards a consistent value.
fn lock_session(handle: &Mutex<QuizSession>) -> MutexGuard<'_, QuizSession> {
    handle.lock().unwrap_or_else(|poisoned| {
        warn!("session lock poisoned; recovering");
        poisoned.into_inner()
    })
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("bank_len", &self.bank.len())
            .field("clock", &self.clock)
            .field("sessions_len", &self.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
