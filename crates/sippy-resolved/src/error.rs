//! Validation errors raised while building a registry.

/// Rejections from [`RegistryBuilder::add`](crate::registry::RegistryBuilder::add).
/// Each names the incident (by test id) so a bad entry in a large seed
/// file is easy to find.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A required string field was empty.
    #[error("resolved issue for {test_id:?}: {field} must be specified")]
    MissingField {
        test_id: String,
        field: &'static str,
    },

    /// An issue must document at least one impacted job run.
    #[error("resolved issue for {test_id:?}: impacted job runs must be specified")]
    NoJobRuns { test_id: String },

    /// An impacted job run is missing its URL or start time.
    #[error("resolved issue for {test_id:?}: job run {index} must have {field}")]
    BadJobRun {
        test_id: String,
        index: usize,
        field: &'static str,
    },
}
