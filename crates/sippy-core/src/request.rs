//! Report request: release windows, drill-down filters, grouping and the
//! statistical thresholds. The full request doubles as the cache key for
//! callers that wrap the engine in a TTL cache.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ReportError;

/// One release comparison window, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseWindow {
    pub release: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Requested drill-down depth. Empty strings mean "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestIdFilter {
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub capability: String,
    #[serde(default)]
    pub test_id: String,
}

/// Column dimensions a report can group by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GroupField {
    Cloud,
    Network,
    Arch,
    Upgrade,
    Variant,
}

/// Set of grouped column dimensions, parsed from the comma-separated wire
/// form ("cloud,arch,network").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBy(pub BTreeSet<GroupField>);

impl GroupBy {
    pub fn parse(raw: &str) -> Self {
        let mut fields = BTreeSet::new();
        for token in raw.split(',') {
            match token.trim() {
                "cloud" => {
                    fields.insert(GroupField::Cloud);
                }
                "network" => {
                    fields.insert(GroupField::Network);
                }
                "arch" => {
                    fields.insert(GroupField::Arch);
                }
                "upgrade" => {
                    fields.insert(GroupField::Upgrade);
                }
                "variant" => {
                    fields.insert(GroupField::Variant);
                }
                _ => {}
            }
        }
        GroupBy(fields)
    }

    pub fn contains(&self, field: GroupField) -> bool {
        self.0.contains(&field)
    }
}

/// Variant/environment filters plus the group-by set. Empty strings mean
/// "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFilter {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub upgrade: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub group_by: GroupBy,
}

/// Dimension values excluded from the report. Interpreted by the fetch
/// adapters when they build their queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upgrades: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

/// Statistical thresholds of the significance calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedOptions {
    /// Required Fisher confidence, percent.
    pub confidence: u32,
    /// Minimum pass-rate drop, percent, before a regression is tested.
    pub pity_factor: u32,
    /// Minimum absolute sample failures before a regression is tested.
    pub minimum_failure: u32,
    /// Treat an empty sample window as not significant instead of missing.
    pub ignore_missing: bool,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        AdvancedOptions {
            confidence: 95,
            pity_factor: 5,
            minimum_failure: 3,
            ignore_missing: false,
        }
    }
}

/// Full report request. Deterministic for caching: identical requests over
/// identical data produce identical reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub base_release: ReleaseWindow,
    pub sample_release: ReleaseWindow,
    #[serde(default)]
    pub test_id_option: TestIdFilter,
    #[serde(default)]
    pub variant_option: VariantFilter,
    #[serde(default)]
    pub exclude_option: ExcludeFilter,
    #[serde(default)]
    pub advanced_option: AdvancedOptions,
}

impl Request {
    /// Cache key for external request-level caches: the serialized request.
    pub fn cache_key(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The detail report needs the test pinned down to a single
    /// environment; reject before any fetch if a field is missing.
    pub fn validate_details(&self) -> Result<(), ReportError> {
        let missing = [
            ("test_id", &self.test_id_option.test_id),
            ("platform", &self.variant_option.platform),
            ("network", &self.variant_option.network),
            ("upgrade", &self.variant_option.upgrade),
            ("arch", &self.variant_option.arch),
            ("variant", &self.variant_option.variant),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReportError::InvalidRequest(format!(
                "all parameters have to be defined for test details, missing: {}",
                missing.join(", ")
            )))
        }
    }
}
