mod ids;
mod question;
mod report;
mod session;

pub use ids::{AnswerIndex, ParseIdError, QuestionId, SessionId};

pub use question::{DEFAULT_CATEGORY, Question, QuestionError};
pub use report::{CategoryScore, LetterGrade, QuestionResult, ScoreReport};
pub use session::{Advance, QuizSession, SessionProgress, SessionState};
