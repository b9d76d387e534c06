//! Engine error taxonomy. Statistical edge cases (missing windows, tiny
//! samples) are verdicts, never errors.

use crate::fetch::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Malformed request, rejected before any fetch.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// One or both window fetches failed. Errors from both sides are
    /// collected; no partial report is produced.
    #[error("report fetch failed: {}", summarize(.0))]
    Fetch(Vec<FetchError>),
}

impl ReportError {
    pub fn fetch(errors: Vec<FetchError>) -> Self {
        ReportError::Fetch(errors)
    }
}

fn summarize(errors: &[FetchError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
