//! The registry itself: build-time validation, then immutable lookups.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sippy_core::suppress::{SuppressionLookup, VariantKey};
use tracing::debug;

use crate::error::RegistryError;
use crate::types::{Issue, ResolvedIssue};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IssueKey {
    release: String,
    test_id: String,
    variant: VariantKey,
}

/// Collects and validates incidents. Finish with [`RegistryBuilder::build`];
/// the resulting registry cannot be mutated, so it is shared freely across
/// concurrent report generations.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    issues: HashMap<IssueKey, Vec<ResolvedIssue>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Add one incident. Every identifying field and every impacted job
    /// run must be filled in; a partially documented incident would
    /// silently suppress nothing (or the wrong thing).
    pub fn add(&mut self, release: &str, issue: ResolvedIssue) -> Result<(), RegistryError> {
        let required = [
            ("release", release),
            ("test id", issue.test_id.as_str()),
            ("test name", issue.test_name.as_str()),
            ("network", issue.variant.network.as_str()),
            ("arch", issue.variant.arch.as_str()),
            ("platform", issue.variant.platform.as_str()),
            ("upgrade", issue.variant.upgrade.as_str()),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(RegistryError::MissingField {
                    test_id: issue.test_id.clone(),
                    field,
                });
            }
        }
        match &issue.issue {
            Issue::Infrastructure(infra) => {
                if infra.description.is_empty() {
                    return Err(RegistryError::MissingField {
                        test_id: issue.test_id.clone(),
                        field: "description",
                    });
                }
            }
            Issue::PayloadBug(payload) => {
                if payload.pull_request_url.is_empty() {
                    return Err(RegistryError::MissingField {
                        test_id: issue.test_id.clone(),
                        field: "pull request url",
                    });
                }
            }
        }
        if issue.impacted_job_runs.is_empty() {
            return Err(RegistryError::NoJobRuns {
                test_id: issue.test_id.clone(),
            });
        }
        for (index, job_run) in issue.impacted_job_runs.iter().enumerate() {
            if job_run.url.is_empty() {
                return Err(RegistryError::BadJobRun {
                    test_id: issue.test_id.clone(),
                    index,
                    field: "url",
                });
            }
            // an epoch start time is a missing value, and a run that
            // never matches any window suppresses nothing
            if job_run.start_time == DateTime::UNIX_EPOCH {
                return Err(RegistryError::BadJobRun {
                    test_id: issue.test_id.clone(),
                    index,
                    field: "start time",
                });
            }
        }

        let key = IssueKey {
            release: release.to_string(),
            test_id: issue.test_id.clone(),
            variant: issue.variant.clone(),
        };
        self.issues.entry(key).or_default().push(issue);
        Ok(())
    }

    pub fn build(self) -> ResolvedIssueRegistry {
        ResolvedIssueRegistry {
            issues: self.issues,
        }
    }
}

/// Immutable store of resolved issues, keyed by release, test id and
/// environment.
#[derive(Debug)]
pub struct ResolvedIssueRegistry {
    issues: HashMap<IssueKey, Vec<ResolvedIssue>>,
}

impl ResolvedIssueRegistry {
    /// The resolved issues relevant to a sample window, with the number of
    /// distinct impacted job runs that started inside it. An issue is
    /// relevant when at least one of its job runs falls strictly between
    /// `start` and `end`; a run impacted by several issues is counted once.
    pub fn resolved_issues_for(
        &self,
        release: &str,
        variant: &VariantKey,
        test_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (Vec<&ResolvedIssue>, usize) {
        let key = IssueKey {
            release: release.to_string(),
            test_id: test_id.to_string(),
            variant: variant.clone(),
        };
        let Some(all_issues) = self.issues.get(&key) else {
            return (Vec::new(), 0);
        };

        let in_window =
            |run_start: DateTime<Utc>| run_start > start && run_start < end;

        let relevant: Vec<&ResolvedIssue> = all_issues
            .iter()
            .filter(|issue| {
                issue
                    .impacted_job_runs
                    .iter()
                    .any(|run| in_window(run.start_time))
            })
            .collect();

        let mut seen_urls: HashSet<&str> = HashSet::new();
        let mut suppressed = 0;
        for issue in &relevant {
            for run in &issue.impacted_job_runs {
                if !seen_urls.insert(run.url.as_str()) {
                    continue;
                }
                if in_window(run.start_time) {
                    suppressed += 1;
                }
            }
        }
        if suppressed > 0 {
            debug!(
                release,
                test_id,
                issues = relevant.len(),
                suppressed,
                "resolved issues cover sample job runs"
            );
        }
        (relevant, suppressed)
    }
}

impl SuppressionLookup for ResolvedIssueRegistry {
    fn suppressed_job_runs(
        &self,
        release: &str,
        variant: &VariantKey,
        test_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> usize {
        self.resolved_issues_for(release, variant, test_id, start, end)
            .1
    }
}
