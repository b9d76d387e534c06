//! Drill-down detail report: per-job, per-job-run evidence for one fully
//! specified test identity, with an overall verdict from the grand totals.

use std::collections::HashMap;
use std::time::Instant;

use tracing::info;

use super::{join_fetches, ReportGenerator};
use crate::errors::ReportError;
use crate::model::{
    ColumnKey, JobRunAggregate, JobRunStats, JobStats, ReleaseStats, RowKey, TestDetails,
    TestStats,
};
use crate::request::Request;
use crate::significance::{assess, Counts};
use crate::stats::fisher_exact;

/// Job runs are linked back to the CI viewer that holds their artifacts.
const JOB_URL_PREFIX: &str = "https://prow.ci.openshift.org/view/gs/origin-ci-test/";

impl ReportGenerator {
    /// Generate the per-job-run detail report. The request must pin the
    /// test down to a single environment; anything less is rejected before
    /// any fetch.
    pub async fn generate_details(&self, request: &Request) -> Result<TestDetails, ReportError> {
        request.validate_details()?;

        let started = Instant::now();
        let (base, sample) = tokio::join!(
            self.fetcher.job_run_status(request, &request.base_release),
            self.fetcher.job_run_status(request, &request.sample_release),
        );
        let (base, sample) = join_fetches(base, sample)?;
        info!(
            base_rows = base.len(),
            sample_rows = sample.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "job run status fetch completed"
        );

        let base_by_job = group_by_job(base, request);
        let sample_by_job = group_by_job(sample, request);
        Ok(assemble_details(request, base_by_job, sample_by_job))
    }
}

/// Group rows under job names with the release strings of both windows
/// (and their previous minor releases) normalized away, so base and sample
/// runs of "the same" job line up across releases.
fn group_by_job(
    rows: Vec<JobRunAggregate>,
    request: &Request,
) -> HashMap<String, Vec<JobRunAggregate>> {
    let mut grouped: HashMap<String, Vec<JobRunAggregate>> = HashMap::new();
    for row in rows {
        let name = normalize_job_name(&row.prow_job, request);
        grouped.entry(name).or_default().push(row);
    }
    grouped
}

fn normalize_job_name(prow_job: &str, request: &Request) -> String {
    let mut name = prow_job.to_string();
    for release in [
        &request.base_release.release,
        &request.sample_release.release,
    ] {
        name = name.replace(release.as_str(), "X.X");
        if let Some(previous) = previous_release(release) {
            name = name.replace(previous.as_str(), "X.X");
        }
    }
    name
}

/// "4.16" -> "4.15"; none for a zero minor or an unversioned string.
fn previous_release(release: &str) -> Option<String> {
    let (major, minor) = release.split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor: u32 = minor.split('.').next()?.parse().ok()?;
    if minor == 0 {
        return None;
    }
    Some(format!("{major}.{}", minor - 1))
}

/// First non-empty Jira mapping wins; every row of one test should carry
/// the same one.
fn absorb_jira(result: &mut TestDetails, row: &JobRunAggregate) {
    if result.jira_component.is_empty() && !row.jira_component.is_empty() {
        result.jira_component = row.jira_component.clone();
    }
    if result.jira_component_id.is_none() {
        result.jira_component_id = row.jira_component_id;
    }
}

fn job_run_stats(row: &JobRunAggregate) -> JobRunStats {
    let mut url = JOB_URL_PREFIX.to_string();
    if let Some((run_path, _)) = row.file_path.split_once("/artifacts/") {
        url.push_str(run_path);
    }
    JobRunStats {
        job_url: url,
        test_stats: TestStats::from_counts(
            row.success_count,
            row.failure_count(),
            row.flake_count,
        ),
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    success: u32,
    failure: u32,
    flake: u32,
}

impl Tally {
    fn add(&mut self, row: &JobRunAggregate) {
        self.success += row.success_count;
        self.failure += row.failure_count();
        self.flake += row.flake_count;
    }

    fn accumulate(&mut self, other: Tally) {
        self.success += other.success;
        self.failure += other.failure;
        self.flake += other.flake;
    }

    fn stats(&self) -> TestStats {
        TestStats::from_counts(self.success, self.failure, self.flake)
    }

    fn counts(&self) -> Counts {
        Counts::new(self.success + self.failure + self.flake, self.success, self.flake)
    }
}

/// Per-job Fisher flag, sample against base, flakes counted as passes on
/// both sides. Informational only.
fn job_significant(sample: Tally, base: Tally, confidence: u32) -> bool {
    match fisher_exact(
        sample.failure,
        sample.success + sample.flake,
        base.failure,
        base.success + base.flake,
    ) {
        Ok(tails) => tails.right < 1.0 - f64::from(confidence) / 100.0,
        Err(_) => false,
    }
}

fn assemble_details(
    request: &Request,
    base_by_job: HashMap<String, Vec<JobRunAggregate>>,
    mut sample_by_job: HashMap<String, Vec<JobRunAggregate>>,
) -> TestDetails {
    let mut result = TestDetails {
        row: RowKey {
            component: request.test_id_option.component.clone(),
            capability: request.test_id_option.capability.clone(),
            test_id: request.test_id_option.test_id.clone(),
            ..RowKey::default()
        },
        column: ColumnKey {
            platform: request.variant_option.platform.clone(),
            arch: request.variant_option.arch.clone(),
            network: request.variant_option.network.clone(),
            upgrade: request.variant_option.upgrade.clone(),
            variant: request.variant_option.variant.clone(),
        },
        ..TestDetails::default()
    };

    let mut base_total = Tally::default();
    let mut sample_total = Tally::default();

    for (job_name, base_rows) in &base_by_job {
        let mut job = JobStats {
            job_name: job_name.clone(),
            ..JobStats::default()
        };
        let mut base_tally = Tally::default();
        for row in base_rows {
            absorb_jira(&mut result, row);
            job.base_job_run_stats.push(job_run_stats(row));
            base_tally.add(row);
        }
        let mut sample_tally = Tally::default();
        if let Some(sample_rows) = sample_by_job.remove(job_name) {
            for row in &sample_rows {
                absorb_jira(&mut result, row);
                job.sample_job_run_stats.push(job_run_stats(row));
                sample_tally.add(row);
            }
        }
        job.base_stats = base_tally.stats();
        job.sample_stats = sample_tally.stats();
        job.significant = job_significant(
            sample_tally,
            base_tally,
            request.advanced_option.confidence,
        );
        result.job_stats.push(job);

        base_total.accumulate(base_tally);
        sample_total.accumulate(sample_tally);
    }

    // Jobs that only ran in the sample window have nothing to compare
    // against; they still contribute evidence and totals.
    for (job_name, sample_rows) in sample_by_job {
        let mut job = JobStats {
            job_name,
            ..JobStats::default()
        };
        let mut sample_tally = Tally::default();
        for row in &sample_rows {
            absorb_jira(&mut result, row);
            job.sample_job_run_stats.push(job_run_stats(row));
            sample_tally.add(row);
        }
        job.sample_stats = sample_tally.stats();
        job.significant = false;
        result.job_stats.push(job);

        sample_total.accumulate(sample_tally);
    }

    result.base_stats = ReleaseStats {
        release: request.base_release.release.clone(),
        stats: base_total.stats(),
    };
    result.sample_stats = ReleaseStats {
        release: request.sample_release.release.clone(),
        stats: sample_total.stats(),
    };
    let (status, fisher) = assess(
        sample_total.counts(),
        base_total.counts(),
        &request.advanced_option,
    );
    result.report_status = status;
    result.fisher_exact = fisher;

    result.job_stats.sort_by(|a, b| a.job_name.cmp(&b.job_name));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_release_decrements_the_minor() {
        assert_eq!(previous_release("4.16").as_deref(), Some("4.15"));
        assert_eq!(previous_release("4.1").as_deref(), Some("4.0"));
        assert_eq!(previous_release("5.0"), None);
        assert_eq!(previous_release("nightly"), None);
    }

    #[test]
    fn job_names_normalize_both_releases_and_their_predecessors() {
        let request = crate::report::tests_support::request_for("4.14", "4.16");
        assert_eq!(
            normalize_job_name("periodic-ci-release-4.16-e2e-aws", &request),
            "periodic-ci-release-X.X-e2e-aws"
        );
        assert_eq!(
            normalize_job_name("periodic-ci-from-4.13-to-4.14-upgrade", &request),
            "periodic-ci-from-X.X-to-X.X-upgrade"
        );
        assert_eq!(
            normalize_job_name("periodic-ci-release-4.15-e2e-gcp", &request),
            "periodic-ci-release-X.X-e2e-gcp"
        );
    }

    #[test]
    fn job_run_url_drops_the_artifact_suffix() {
        let row = JobRunAggregate {
            file_path: "logs/periodic-ci-e2e/123456/artifacts/junit/junit_e2e.xml".into(),
            ..JobRunAggregate::default()
        };
        assert_eq!(
            job_run_stats(&row).job_url,
            format!("{JOB_URL_PREFIX}logs/periodic-ci-e2e/123456")
        );

        let bare = JobRunAggregate {
            file_path: "no-artifacts-here.xml".into(),
            ..JobRunAggregate::default()
        };
        assert_eq!(job_run_stats(&bare).job_url, JOB_URL_PREFIX);
    }

    #[test]
    fn per_job_significance_compares_sample_against_base() {
        let sample = Tally {
            success: 51,
            failure: 49,
            flake: 0,
        };
        let base = Tally {
            success: 900,
            failure: 90,
            flake: 10,
        };
        assert!(job_significant(sample, base, 95));
        // mirrored comparison: a sample matching its base is not flagged
        let steady = Tally {
            success: 90,
            failure: 9,
            flake: 1,
        };
        assert!(!job_significant(steady, base, 95));
    }

    #[test]
    fn sample_only_jobs_are_never_flagged_significant() {
        let sample = Tally {
            success: 1,
            failure: 9,
            flake: 0,
        };
        assert!(!job_significant(sample, Tally::default(), 95));
    }
}
