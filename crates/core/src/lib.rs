#![forbid(unsafe_code)]

//! Domain model for quiz sessions: questions, per-user session state and
//! scoring. No I/O and no logging live here.

pub mod error;
pub mod model;
pub mod time;

pub use error::Error;
pub use time::Clock;
