//! End-to-end matrix generation against a fixture fetcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use sippy_core::fetch::{FetchError, StatusFetcher};
use sippy_core::model::{ColumnKey, Report, RowKey, TestAggregate, TestIdentity, Verdict};
use sippy_core::report::ReportGenerator;
use sippy_core::request::{GroupBy, ReleaseWindow, Request};
use sippy_core::suppress::{SuppressionLookup, VariantKey};
use sippy_core::ReportError;

struct FakeFetcher {
    base: Vec<(TestIdentity, TestAggregate)>,
    sample: Vec<(TestIdentity, TestAggregate)>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn new(
        base: Vec<(TestIdentity, TestAggregate)>,
        sample: Vec<(TestIdentity, TestAggregate)>,
    ) -> Arc<Self> {
        Arc::new(FakeFetcher {
            base,
            sample,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl StatusFetcher for FakeFetcher {
    async fn test_status(
        &self,
        request: &Request,
        window: &ReleaseWindow,
    ) -> Result<Vec<(TestIdentity, TestAggregate)>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if window.release == request.base_release.release {
            Ok(self.base.clone())
        } else {
            Ok(self.sample.clone())
        }
    }

    async fn job_run_status(
        &self,
        _request: &Request,
        _window: &ReleaseWindow,
    ) -> Result<Vec<sippy_core::model::JobRunAggregate>, FetchError> {
        Ok(Vec::new())
    }
}

struct FailingFetcher;

#[async_trait]
impl StatusFetcher for FailingFetcher {
    async fn test_status(
        &self,
        _request: &Request,
        window: &ReleaseWindow,
    ) -> Result<Vec<(TestIdentity, TestAggregate)>, FetchError> {
        Err(FetchError::Query {
            message: format!("warehouse unreachable for {}", window.release),
        })
    }

    async fn job_run_status(
        &self,
        _request: &Request,
        _window: &ReleaseWindow,
    ) -> Result<Vec<sippy_core::model::JobRunAggregate>, FetchError> {
        Err(FetchError::Query {
            message: "warehouse unreachable".into(),
        })
    }
}

fn window(release: &str, year: i32, month: u32) -> ReleaseWindow {
    ReleaseWindow {
        release: release.to_string(),
        start: Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(year, month, 28, 0, 0, 0).unwrap(),
    }
}

fn request() -> Request {
    let mut request = Request {
        base_release: window("4.15", 2024, 1),
        sample_release: window("4.16", 2024, 2),
        test_id_option: Default::default(),
        variant_option: Default::default(),
        exclude_option: Default::default(),
        advanced_option: Default::default(),
    };
    request.variant_option.group_by = GroupBy::parse("cloud,arch,network");
    request
}

fn identity(test_id: &str, platform: &str) -> TestIdentity {
    TestIdentity {
        test_id: test_id.to_string(),
        test_name: format!("test {test_id}"),
        network: "ovn".into(),
        upgrade: "upgrade-micro".into(),
        arch: "amd64".into(),
        platform: platform.to_string(),
        variants: Some("standard".into()),
    }
}

fn aggregate(component: &str, total: u32, success: u32, flake: u32) -> TestAggregate {
    TestAggregate {
        component: component.to_string(),
        capabilities: vec!["Other".into()],
        variants: vec!["standard".into()],
        total_count: total,
        success_count: success,
        flake_count: flake,
    }
}

fn cell_map(report: &Report) -> HashMap<(RowKey, ColumnKey), Verdict> {
    let mut cells = HashMap::new();
    for row in &report.rows {
        for column in &row.columns {
            cells.insert((row.id.clone(), column.id.clone()), column.status);
        }
    }
    cells
}

fn component_row(component: &str) -> RowKey {
    RowKey {
        component: component.to_string(),
        ..RowKey::default()
    }
}

fn grouped_column(platform: &str) -> ColumnKey {
    // requests group by cloud, arch, network
    ColumnKey {
        platform: platform.to_string(),
        arch: "amd64".into(),
        network: "ovn".into(),
        ..ColumnKey::default()
    }
}

#[tokio::test]
async fn healthy_tests_report_not_significant() {
    let fetcher = FakeFetcher::new(
        vec![(identity("1", "aws"), aggregate("etcd", 1000, 900, 10))],
        vec![(identity("1", "aws"), aggregate("etcd", 100, 90, 1))],
    );
    let generator = ReportGenerator::new(fetcher);
    let report = generator.generate(&request()).await.unwrap();

    let cells = cell_map(&report);
    assert_eq!(
        cells[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::NotSignificant
    );
}

#[tokio::test]
async fn absent_cells_are_filled_with_missing_basis_and_sample() {
    // two tests in disjoint components and platforms leave two holes
    let fetcher = FakeFetcher::new(
        vec![
            (identity("1", "aws"), aggregate("etcd", 1000, 900, 10)),
            (identity("2", "gcp"), aggregate("monitoring", 1000, 900, 10)),
        ],
        vec![
            (identity("1", "aws"), aggregate("etcd", 100, 90, 1)),
            (identity("2", "gcp"), aggregate("monitoring", 100, 90, 1)),
        ],
    );
    let generator = ReportGenerator::new(fetcher);
    let report = generator.generate(&request()).await.unwrap();

    let cells = cell_map(&report);
    assert_eq!(cells.len(), 4);
    assert_eq!(
        cells[&(component_row("etcd"), grouped_column("gcp"))],
        Verdict::MissingBasisAndSample
    );
    assert_eq!(
        cells[&(component_row("monitoring"), grouped_column("aws"))],
        Verdict::MissingBasisAndSample
    );
}

#[tokio::test]
async fn regressed_rows_surface_before_healthy_rows() {
    let fetcher = FakeFetcher::new(
        vec![
            (identity("1", "aws"), aggregate("etcd", 1000, 900, 10)),
            (identity("2", "aws"), aggregate("monitoring", 1000, 900, 10)),
        ],
        vec![
            (identity("1", "aws"), aggregate("etcd", 100, 90, 1)),
            // collapsed pass rate, well past the pity band
            (identity("2", "aws"), aggregate("monitoring", 100, 50, 1)),
        ],
    );
    let generator = ReportGenerator::new(fetcher);
    let report = generator.generate(&request()).await.unwrap();

    assert_eq!(report.rows[0].id, component_row("monitoring"));
    assert_eq!(report.rows[0].columns[0].status, Verdict::ExtremeRegression);
    assert_eq!(report.rows[1].id, component_row("etcd"));
}

#[tokio::test]
async fn base_only_tests_are_missing_sample_unless_ignored() {
    let fetcher = FakeFetcher::new(
        vec![(identity("1", "aws"), aggregate("etcd", 1000, 900, 10))],
        vec![],
    );
    let generator = ReportGenerator::new(fetcher);

    let report = generator.generate(&request()).await.unwrap();
    assert_eq!(
        cell_map(&report)[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::MissingSample
    );

    let mut ignoring = request();
    ignoring.advanced_option.ignore_missing = true;
    let report = generator.generate(&ignoring).await.unwrap();
    assert_eq!(
        cell_map(&report)[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::NotSignificant
    );
}

#[tokio::test]
async fn sample_only_tests_are_missing_basis() {
    let fetcher = FakeFetcher::new(
        vec![],
        vec![(identity("1", "aws"), aggregate("etcd", 100, 90, 1))],
    );
    let generator = ReportGenerator::new(fetcher);
    let report = generator.generate(&request()).await.unwrap();

    assert_eq!(
        cell_map(&report)[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::MissingBasis
    );
}

#[tokio::test]
async fn regressions_win_cell_merges() {
    // two tests fold into the same component cell, one healthy one not
    let fetcher = FakeFetcher::new(
        vec![
            (identity("1", "aws"), aggregate("etcd", 1000, 900, 10)),
            (identity("2", "aws"), aggregate("etcd", 1000, 900, 10)),
        ],
        vec![
            (identity("1", "aws"), aggregate("etcd", 100, 90, 1)),
            (identity("2", "aws"), aggregate("etcd", 100, 50, 1)),
        ],
    );
    let generator = ReportGenerator::new(fetcher);
    let report = generator.generate(&request()).await.unwrap();

    assert_eq!(
        cell_map(&report)[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::ExtremeRegression
    );
}

#[tokio::test]
async fn variant_grouping_fans_out_columns() {
    let mut agg = aggregate("etcd", 1000, 900, 10);
    agg.variants = vec!["standard".into(), "fips".into()];
    let mut sample_agg = aggregate("etcd", 100, 90, 1);
    sample_agg.variants = vec!["standard".into(), "fips".into()];
    let fetcher = FakeFetcher::new(
        vec![(identity("1", "aws"), agg)],
        vec![(identity("1", "aws"), sample_agg)],
    );
    let generator = ReportGenerator::new(fetcher);

    let mut grouped = request();
    grouped.variant_option.group_by = GroupBy::parse("cloud,arch,network,variant");
    let report = generator.generate(&grouped).await.unwrap();

    let variants: Vec<&str> = report.rows[0]
        .columns
        .iter()
        .map(|column| column.id.variant.as_str())
        .collect();
    assert_eq!(variants, vec!["fips", "standard"]);
}

#[tokio::test]
async fn drilldown_to_a_test_pins_row_and_environment() {
    let fetcher = FakeFetcher::new(
        vec![(identity("1", "aws"), aggregate("etcd", 1000, 900, 10))],
        vec![(identity("1", "aws"), aggregate("etcd", 100, 50, 1))],
    );
    let generator = ReportGenerator::new(fetcher);

    let mut drill = request();
    drill.test_id_option.component = "etcd".into();
    drill.test_id_option.capability = "Other".into();
    drill.test_id_option.test_id = "1".into();
    let report = generator.generate(&drill).await.unwrap();

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.id.test_id, "1");
    assert_eq!(row.id.test_name, "test 1");
    assert_eq!(row.id.capability, "Other");
    // all four environment fields populated regardless of group-by
    let column = &row.columns[0].id;
    assert_eq!(column.platform, "aws");
    assert_eq!(column.network, "ovn");
    assert_eq!(column.arch, "amd64");
    assert_eq!(column.upgrade, "upgrade-micro");
    assert_eq!(row.columns[0].status, Verdict::ExtremeRegression);
}

#[tokio::test]
async fn generation_is_deterministic() {
    let base = vec![
        (identity("1", "gcp"), aggregate("etcd", 1000, 900, 10)),
        (identity("2", "aws"), aggregate("monitoring", 1000, 900, 10)),
        (identity("3", "azure"), aggregate("api", 1000, 900, 10)),
    ];
    let sample = vec![
        (identity("1", "gcp"), aggregate("etcd", 100, 90, 1)),
        (identity("2", "aws"), aggregate("monitoring", 100, 50, 1)),
        (identity("3", "azure"), aggregate("api", 100, 90, 1)),
    ];
    let generator = ReportGenerator::new(FakeFetcher::new(base, sample));

    let first = generator.generate(&request()).await.unwrap();
    let second = generator.generate(&request()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn fetch_errors_from_both_windows_are_collected() {
    let generator = ReportGenerator::new(Arc::new(FailingFetcher));
    let err = generator.generate(&request()).await.unwrap_err();

    let ReportError::Fetch(errors) = err else {
        panic!("expected a fetch error, got {err}");
    };
    assert_eq!(errors.len(), 2);
    let summary = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    assert!(summary.contains("4.15"));
    assert!(summary.contains("4.16"));
}

struct FixedSuppression {
    job_runs: usize,
}

impl SuppressionLookup for FixedSuppression {
    fn suppressed_job_runs(
        &self,
        _release: &str,
        _variant: &VariantKey,
        _test_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> usize {
        self.job_runs
    }
}

#[tokio::test]
async fn suppressed_job_runs_can_clear_a_regression() {
    let base = vec![(identity("1", "aws"), aggregate("etcd", 1000, 900, 10))];
    // 49 failures; discounting 47 documented runs leaves too few to flag
    let sample = vec![(identity("1", "aws"), aggregate("etcd", 100, 50, 1))];

    let bare = ReportGenerator::new(FakeFetcher::new(base.clone(), sample.clone()));
    let report = bare.generate(&request()).await.unwrap();
    assert_eq!(
        cell_map(&report)[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::ExtremeRegression
    );

    let suppressing = ReportGenerator::new(FakeFetcher::new(base, sample))
        .with_suppression(Arc::new(FixedSuppression { job_runs: 47 }));
    let report = suppressing.generate(&request()).await.unwrap();
    assert_eq!(
        cell_map(&report)[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::NotSignificant
    );
}

#[tokio::test]
async fn oversized_suppression_counts_clamp_instead_of_wrapping() {
    let base = vec![(identity("1", "aws"), aggregate("etcd", 1000, 900, 10))];
    let sample = vec![(identity("1", "aws"), aggregate("etcd", 100, 50, 1))];

    // 2^32 would truncate to a discount of zero; clamping discounts
    // everything discountable instead, flooring the sample at its
    // pass count so no failures remain to flag
    let generator = ReportGenerator::new(FakeFetcher::new(base, sample))
        .with_suppression(Arc::new(FixedSuppression {
            job_runs: (1u64 << 32) as usize,
        }));
    let report = generator.generate(&request()).await.unwrap();
    assert_eq!(
        cell_map(&report)[&(component_row("etcd"), grouped_column("aws"))],
        Verdict::NotSignificant
    );
}
