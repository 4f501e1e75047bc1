#![forbid(unsafe_code)]

pub mod bank;
pub mod config;
pub mod error;
pub mod export;
pub mod registry;

pub use quiz_core::Clock;

pub use bank::QuestionBank;
pub use config::{BankConfig, LogConfig, QuizConfig};
pub use error::{BankError, ConfigError, ExportError};
pub use export::{ScoreExport, export_json, export_session};
pub use registry::{AnswerOutcome, SessionRegistry};
