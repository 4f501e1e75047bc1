//! Configuration loading with layered sources.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bank::QuestionBank;
use crate::error::{BankError, ConfigError};

/// Where the question bank comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    /// TOML file with `[[questions]]` tables. The builtin bank is used when unset.
    pub path: Option<PathBuf>,
    /// Reject duplicate ids and out-of-range correct indices at load time.
    pub validate: bool,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            path: None,
            validate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive, e.g. `info` or `services=debug`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Main quiz service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub bank: BankConfig,
    pub log: LogConfig,
}

impl QuizConfig {
    pub const ENV_PREFIX: &'static str = "QUIZ_";

    /// Layered sources, lowest priority first:
    ///
    /// 1. Default values
    /// 2. The TOML file at `path`, if given
    /// 3. `QUIZ_*` environment variables (`QUIZ_BANK__VALIDATE=false`)
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(QuizConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    /// Load configuration, optionally from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `path` does not exist and
    /// `ConfigError::Figment` if a source cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
        }
        Ok(Self::figment(path).extract()?)
    }

    /// Build the question bank this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the bank file cannot be read or fails validation.
    pub fn build_bank(&self) -> Result<QuestionBank, BankError> {
        match &self.bank.path {
            None => Ok(QuestionBank::builtin()),
            Some(path) => QuestionBank::from_toml_file(path, self.bank.validate),
        }
    }
}
