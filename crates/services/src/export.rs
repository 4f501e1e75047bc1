use chrono::{DateTime, Utc};
use serde::Serialize;

use quiz_core::model::{ScoreReport, SessionId};

use crate::error::ExportError;
use crate::registry::SessionRegistry;

/// Downloadable record of a session's results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreExport {
    pub session_id: SessionId,
    pub exported_at: DateTime<Utc>,
    pub report: ScoreReport,
}

/// Build an export for `id`, or `None` if the session is unknown.
#[must_use]
pub fn export_session(registry: &SessionRegistry, id: SessionId) -> Option<ScoreExport> {
    let report = registry.report(id)?;
    Some(ScoreExport {
        session_id: id,
        exported_at: registry.clock().now(),
        report,
    })
}

/// Pretty-printed JSON export for `id`.
///
/// # Errors
///
/// Returns `ExportError::Json` if serialization fails.
pub fn export_json(registry: &SessionRegistry, id: SessionId) -> Result<Option<String>, ExportError> {
    export_session(registry, id)
        .map(|export| serde_json::to_string_pretty(&export))
        .transpose()
        .map_err(ExportError::from)
}
