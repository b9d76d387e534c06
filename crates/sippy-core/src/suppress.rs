//! Seam to the resolved-issue registry: the engine asks how many sample
//! job runs are covered by a documented, already-fixed incident and
//! discounts them before assessing significance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TestIdentity;

/// Suppression granularity: the four environment dimensions, without the
/// free-form variant tag or capability. One incident write-up covers every
/// variant of the affected jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub network: String,
    pub upgrade: String,
    pub arch: String,
    pub platform: String,
}

impl VariantKey {
    pub fn from_identity(identity: &TestIdentity) -> Self {
        VariantKey {
            network: identity.network.clone(),
            upgrade: identity.upgrade.clone(),
            arch: identity.arch.clone(),
            platform: identity.platform.clone(),
        }
    }
}

/// Read path into a registry of resolved issues. Implementations must be
/// immutable after construction; the engine shares one instance across
/// concurrent reports without locking.
pub trait SuppressionLookup: Send + Sync {
    /// Number of distinct documented job runs for this test and variant
    /// combination that started inside `(start, end)`, exclusive bounds.
    fn suppressed_job_runs(
        &self,
        release: &str,
        variant: &VariantKey,
        test_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> usize;
}
