//! Core data model for the component readiness report: test identities,
//! aggregated counts, row/column keys and the verdict scale.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Composite natural key for one test run configuration. Produced by the
/// fetch adapters; base and sample rows for the same configuration carry an
/// identical identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestIdentity {
    pub test_id: String,
    pub test_name: String,
    pub network: String,
    pub upgrade: String,
    pub arch: String,
    pub platform: String,
    /// Flattened variant tags ("standard,fips"), part of the key so that
    /// differently-tagged runs of the same test stay separate buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<String>,
}

/// Aggregated counts for one test identity within one release window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestAggregate {
    pub component: String,
    pub capabilities: Vec<String>,
    pub variants: Vec<String>,
    pub total_count: u32,
    pub success_count: u32,
    pub flake_count: u32,
}

impl TestAggregate {
    /// Failures are derived, floored at zero for defect rows where success
    /// plus flake exceeds the total.
    pub fn failure_count(&self) -> u32 {
        self.total_count
            .saturating_sub(self.success_count.saturating_add(self.flake_count))
    }
}

/// One (job, junit file) row used by the drill-down detail report. The
/// Jira fields ride along from the component mapping joined onto each row;
/// empty/absent when the warehouse has no mapping for the test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRunAggregate {
    pub test_name: String,
    pub prow_job: String,
    pub file_path: String,
    pub total_count: u32,
    pub success_count: u32,
    pub flake_count: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jira_component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_component_id: Option<u64>,
}

impl JobRunAggregate {
    pub fn failure_count(&self) -> u32 {
        self.total_count
            .saturating_sub(self.success_count.saturating_add(self.flake_count))
    }
}

/// Row axis of the report matrix. Empty strings mean "not part of this
/// drill-down depth". Field order is the sort order: the derived `Ord` is
/// the lexicographic (component, capability, test_name, test_id) comparator.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RowKey {
    pub component: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub capability: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub test_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub test_id: String,
}

/// Column axis of the report matrix. Which fields are populated is decided
/// by the request's group-by set. Field order is the sort order:
/// (platform, arch, network, upgrade, variant).
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ColumnKey {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub platform: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upgrade: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
}

/// Classification of one test's pass-rate movement between the base and
/// sample windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Significant regression with a pass-rate drop above 15 points.
    ExtremeRegression,
    SignificantRegression,
    /// Sample window has no runs for a test the base window had.
    MissingSample,
    NotSignificant,
    /// Base window has no runs for a test the sample window had.
    MissingBasis,
    /// Neither window contributed evidence for this row/column cell.
    MissingBasisAndSample,
    SignificantImprovement,
}

impl Verdict {
    /// Numeric wire code. Regressions are negative with severity growing
    /// downward, matching the published report encoding.
    pub fn code(self) -> i8 {
        match self {
            Verdict::ExtremeRegression => -3,
            Verdict::SignificantRegression => -2,
            Verdict::MissingSample => -1,
            Verdict::NotSignificant => 0,
            Verdict::MissingBasis => 1,
            Verdict::MissingBasisAndSample => 2,
            Verdict::SignificantImprovement => 3,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -3 => Some(Verdict::ExtremeRegression),
            -2 => Some(Verdict::SignificantRegression),
            -1 => Some(Verdict::MissingSample),
            0 => Some(Verdict::NotSignificant),
            1 => Some(Verdict::MissingBasis),
            2 => Some(Verdict::MissingBasisAndSample),
            3 => Some(Verdict::SignificantImprovement),
            _ => None,
        }
    }

    pub fn is_regression(self) -> bool {
        self.code() <= Verdict::SignificantRegression.code()
    }

    /// Merge an incoming verdict into an existing cell. A strictly more
    /// severe regression always overwrites; an improvement overwrites a
    /// not-significant cell but never hides a regression.
    pub fn merge(existing: Verdict, incoming: Verdict) -> Verdict {
        if (incoming.code() < Verdict::NotSignificant.code() && incoming.code() < existing.code())
            || (existing == Verdict::NotSignificant
                && incoming == Verdict::SignificantImprovement)
        {
            incoming
        } else {
            existing
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i8::deserialize(deserializer)?;
        Verdict::from_code(code)
            .ok_or_else(|| D::Error::custom(format!("unknown verdict code {code}")))
    }
}

/// The assembled row/column matrix. Rows containing at least one regression
/// cell come first; both partitions are internally sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(flatten)]
    pub id: RowKey,
    pub columns: Vec<ReportColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportColumn {
    #[serde(flatten)]
    pub id: ColumnKey,
    pub status: Verdict,
}

/// Success/failure/flake counts with the derived success rate (flakes count
/// as passes for the rate).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStats {
    pub success_rate: f64,
    pub success_count: u32,
    pub failure_count: u32,
    pub flake_count: u32,
}

impl TestStats {
    pub fn from_counts(success: u32, failure: u32, flake: u32) -> Self {
        let total = success + failure + flake;
        let success_rate = if total == 0 {
            0.0
        } else {
            f64::from(success + flake) / f64::from(total)
        };
        TestStats {
            success_rate,
            success_count: success,
            failure_count: failure,
            flake_count: flake,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseStats {
    pub release: String,
    #[serde(flatten)]
    pub stats: TestStats,
}

/// Stats for a single job run, with the job run URL derived from the junit
/// artifact path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRunStats {
    pub job_url: String,
    pub test_stats: TestStats,
}

/// Per-job breakdown inside the detail report. `significant` is
/// informational only; the overall verdict is computed from the grand
/// totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStats {
    pub job_name: String,
    pub sample_stats: TestStats,
    pub base_stats: TestStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_job_run_stats: Vec<JobRunStats>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_job_run_stats: Vec<JobRunStats>,
    pub significant: bool,
}

/// Drill-down report for one fully specified test identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestDetails {
    #[serde(flatten)]
    pub row: RowKey,
    #[serde(flatten)]
    pub column: ColumnKey,
    /// Jira triage target for the test, taken from the first job-run row
    /// that carries one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jira_component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_component_id: Option<u64>,
    pub sample_stats: ReleaseStats,
    pub base_stats: ReleaseStats,
    pub fisher_exact: f64,
    pub report_status: Verdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_stats: Vec<JobStats>,
}

impl Default for ReportColumn {
    fn default() -> Self {
        ReportColumn {
            id: ColumnKey::default(),
            status: Verdict::MissingBasisAndSample,
        }
    }
}

impl Default for Verdict {
    fn default() -> Self {
        Verdict::NotSignificant
    }
}
