//! Registry of resolved CI incidents. Component Readiness discounts the
//! job runs documented here from sample windows, so a regression that was
//! triaged, understood and fixed stops paging people once the fix merges.

pub mod data;
pub mod error;
pub mod registry;
pub mod types;

pub use data::seeded_registry;
pub use error::RegistryError;
pub use registry::{RegistryBuilder, ResolvedIssueRegistry};
pub use types::{InfrastructureIssue, Issue, JobRun, PayloadIssue, ResolvedIssue};
