//! Boundary to the warehouse that holds test run outcomes. Adapters return
//! fully materialized lists; retries, if any, live behind this trait.

use async_trait::async_trait;

use crate::model::{JobRunAggregate, TestAggregate, TestIdentity};
use crate::request::{ReleaseWindow, Request};

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The query itself failed (network, warehouse outage).
    #[error("query failed: {message}")]
    Query { message: String },

    /// A row came back that does not fit the expected schema.
    #[error("malformed row: {message}")]
    Malformed { message: String },
}

/// Aggregated test outcomes for one release window, scoped by the request's
/// filters. Implementations exist for BigQuery and for fixtures in tests.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Per-test aggregates for the matrix report.
    async fn test_status(
        &self,
        request: &Request,
        window: &ReleaseWindow,
    ) -> Result<Vec<(TestIdentity, TestAggregate)>, FetchError>;

    /// Raw per-job-run rows for the drill-down detail report.
    async fn job_run_status(
        &self,
        request: &Request,
        window: &ReleaseWindow,
    ) -> Result<Vec<JobRunAggregate>, FetchError>;
}
