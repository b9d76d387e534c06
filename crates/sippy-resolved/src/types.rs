//! Incident records: a documented CI problem, its fix evidence and the
//! job runs it impacted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sippy_core::suppress::VariantKey;

/// An infrastructure problem outside the product: cloud quota, mirror
/// outage, CI cluster trouble. The tracking link is optional because some
/// incidents are resolved before anyone files one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureIssue {
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jira_url: String,
    pub resolution_date: DateTime<Utc>,
}

/// A product bug that shipped in the payload and was fixed by a merged
/// pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadIssue {
    pub pull_request_url: String,
    pub resolution_date: DateTime<Utc>,
}

/// Why the impacted job runs failed. The variants carry their own
/// evidence, so an issue cannot be half-specified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Issue {
    Infrastructure(InfrastructureIssue),
    PayloadBug(PayloadIssue),
}

impl Issue {
    pub fn issue_type(&self) -> &'static str {
        match self {
            Issue::Infrastructure(_) => "Infrastructure",
            Issue::PayloadBug(_) => "PayloadBug",
        }
    }

    pub fn resolution_date(&self) -> DateTime<Utc> {
        match self {
            Issue::Infrastructure(issue) => issue.resolution_date,
            Issue::PayloadBug(issue) => issue.resolution_date,
        }
    }
}

/// One job run impacted by an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRun {
    pub url: String,
    pub start_time: DateTime<Utc>,
}

/// A triaged, fixed incident for one test in one environment. Job runs
/// listed here are discounted from sample windows that contain them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIssue {
    pub test_id: String,
    pub test_name: String,
    pub variant: VariantKey,
    pub issue: Issue,
    pub impacted_job_runs: Vec<JobRun>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn issue_type_names_match_the_triage_records() {
        let date = Utc.with_ymd_and_hms(2024, 1, 21, 6, 9, 9).unwrap();
        let infra = Issue::Infrastructure(InfrastructureIssue {
            description: "cloud problems".into(),
            jira_url: String::new(),
            resolution_date: date,
        });
        assert_eq!(infra.issue_type(), "Infrastructure");
        assert_eq!(infra.resolution_date(), date);

        let payload = Issue::PayloadBug(PayloadIssue {
            pull_request_url: "https://github.com/openshift/origin/pull/28549".into(),
            resolution_date: date,
        });
        assert_eq!(payload.issue_type(), "PayloadBug");
    }

    #[test]
    fn issue_serializes_with_a_type_tag() {
        let date = Utc.with_ymd_and_hms(2024, 1, 24, 23, 54, 33).unwrap();
        let issue = Issue::PayloadBug(PayloadIssue {
            pull_request_url: "https://github.com/openshift/origin/pull/28549".into(),
            resolution_date: date,
        });
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "PayloadBug");
        assert_eq!(
            json["pull_request_url"],
            "https://github.com/openshift/origin/pull/28549"
        );
    }
}
