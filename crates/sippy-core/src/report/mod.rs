//! Report assembler: fans the base and sample fetches out concurrently,
//! classifies every test, expands verdicts into row/column cells and emits
//! the sorted matrix.

mod details;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::dimensions::{resolve_columns, resolve_rows, ComponentResolver, MappedComponents};
use crate::errors::ReportError;
use crate::fetch::{FetchError, StatusFetcher};
use crate::model::{
    ColumnKey, Report, ReportColumn, ReportRow, RowKey, TestAggregate, TestIdentity, Verdict,
};
use crate::request::Request;
use crate::significance::{assess, Counts};
use crate::suppress::{SuppressionLookup, VariantKey};

/// The engine. Holds collaborators only; per-request state lives on the
/// stack of one `generate` call, so a single instance serves concurrent
/// requests.
pub struct ReportGenerator {
    fetcher: Arc<dyn StatusFetcher>,
    components: Arc<dyn ComponentResolver>,
    suppression: Option<Arc<dyn SuppressionLookup>>,
}

impl ReportGenerator {
    pub fn new(fetcher: Arc<dyn StatusFetcher>) -> Self {
        ReportGenerator {
            fetcher,
            components: Arc::new(MappedComponents),
            suppression: None,
        }
    }

    /// Override the component/capability mapping strategy.
    pub fn with_component_resolver(mut self, components: Arc<dyn ComponentResolver>) -> Self {
        self.components = components;
        self
    }

    /// Discount job runs documented by a resolved-issue registry before
    /// assessing sample windows.
    pub fn with_suppression(mut self, suppression: Arc<dyn SuppressionLookup>) -> Self {
        self.suppression = Some(suppression);
        self
    }

    /// Generate the row/column verdict matrix for the request.
    pub async fn generate(&self, request: &Request) -> Result<Report, ReportError> {
        let started = Instant::now();
        let (base, sample) = tokio::join!(
            self.fetcher.test_status(request, &request.base_release),
            self.fetcher.test_status(request, &request.sample_release),
        );
        let (base, sample) = join_fetches(base, sample)?;
        info!(
            base_rows = base.len(),
            sample_rows = sample.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "test status fetch completed"
        );

        let base_status: HashMap<TestIdentity, TestAggregate> = base.into_iter().collect();
        let sample_status: HashMap<TestIdentity, TestAggregate> = sample.into_iter().collect();
        Ok(self.assemble_matrix(request, base_status, sample_status))
    }

    fn assemble_matrix(
        &self,
        request: &Request,
        base_status: HashMap<TestIdentity, TestAggregate>,
        mut sample_status: HashMap<TestIdentity, TestAggregate>,
    ) -> Report {
        let mut cells: HashMap<RowKey, HashMap<ColumnKey, Verdict>> = HashMap::new();
        let mut all_rows: HashSet<RowKey> = HashSet::new();
        let mut all_columns: HashSet<ColumnKey> = HashSet::new();

        for (identity, base_agg) in &base_status {
            let verdict = match sample_status.remove(identity) {
                // Absent sample goes through the calculator with zero
                // counts so IgnoreMissing applies uniformly.
                None => {
                    assess(
                        Counts::default(),
                        counts_of(base_agg),
                        &request.advanced_option,
                    )
                    .0
                }
                Some(sample_agg) => {
                    let mut sample_counts = counts_of(&sample_agg);
                    if let Some(suppression) = &self.suppression {
                        let suppressed = suppression.suppressed_job_runs(
                            &request.sample_release.release,
                            &VariantKey::from_identity(identity),
                            &identity.test_id,
                            request.sample_release.start,
                            request.sample_release.end,
                        );
                        if suppressed > 0 {
                            debug!(
                                test_id = identity.test_id.as_str(),
                                suppressed, "discounting documented job runs"
                            );
                            sample_counts
                                .discount_runs(u32::try_from(suppressed).unwrap_or(u32::MAX));
                        }
                    }
                    assess(sample_counts, counts_of(base_agg), &request.advanced_option).0
                }
            };
            self.fold(
                request,
                identity,
                base_agg,
                verdict,
                &mut cells,
                &mut all_rows,
                &mut all_columns,
            );
        }

        // Whatever is left in the sample set has no base counterpart.
        for (identity, sample_agg) in &sample_status {
            self.fold(
                request,
                identity,
                sample_agg,
                Verdict::MissingBasis,
                &mut cells,
                &mut all_rows,
                &mut all_columns,
            );
        }

        let mut sorted_rows: Vec<RowKey> = all_rows.into_iter().collect();
        sorted_rows.sort();
        let mut sorted_columns: Vec<ColumnKey> = all_columns.into_iter().collect();
        sorted_columns.sort();

        // Rows carrying a regression surface first; both partitions keep
        // their sorted order.
        let mut regressed = Vec::new();
        let mut steady = Vec::new();
        for row_id in sorted_rows {
            let Some(row_cells) = cells.get(&row_id) else {
                continue;
            };
            let mut columns = Vec::with_capacity(sorted_columns.len());
            let mut has_regression = false;
            for column_id in &sorted_columns {
                let status = row_cells
                    .get(column_id)
                    .copied()
                    .unwrap_or(Verdict::MissingBasisAndSample);
                has_regression = has_regression || status.is_regression();
                columns.push(ReportColumn {
                    id: column_id.clone(),
                    status,
                });
            }
            let row = ReportRow { id: row_id, columns };
            if has_regression {
                regressed.push(row);
            } else {
                steady.push(row);
            }
        }
        regressed.append(&mut steady);
        Report { rows: regressed }
    }

    #[allow(clippy::too_many_arguments)]
    fn fold(
        &self,
        request: &Request,
        identity: &TestIdentity,
        aggregate: &TestAggregate,
        verdict: Verdict,
        cells: &mut HashMap<RowKey, HashMap<ColumnKey, Verdict>>,
        all_rows: &mut HashSet<RowKey>,
        all_columns: &mut HashSet<ColumnKey>,
    ) {
        let (component, capabilities) = self
            .components
            .component_and_capabilities(identity, aggregate);
        let rows = resolve_rows(
            &request.test_id_option,
            &component,
            &capabilities,
            identity,
        );
        let columns = resolve_columns(
            &request.variant_option,
            !request.test_id_option.test_id.is_empty(),
            identity,
            aggregate,
        );

        for column in &columns {
            all_columns.insert(column.clone());
        }
        for row in rows {
            all_rows.insert(row.clone());
            let row_cells = cells.entry(row).or_default();
            for column in &columns {
                match row_cells.get_mut(column) {
                    None => {
                        row_cells.insert(column.clone(), verdict);
                    }
                    Some(existing) => {
                        *existing = Verdict::merge(*existing, verdict);
                    }
                }
            }
        }
    }
}

fn counts_of(aggregate: &TestAggregate) -> Counts {
    Counts::new(
        aggregate.total_count,
        aggregate.success_count,
        aggregate.flake_count,
    )
}


/// Join the two window fetches, collecting errors from both sides so a
/// caller sees every failure, not just the first.
fn join_fetches<T, U>(
    base: Result<T, FetchError>,
    sample: Result<U, FetchError>,
) -> Result<(T, U), ReportError> {
    match (base, sample) {
        (Ok(base), Ok(sample)) => Ok((base, sample)),
        (base, sample) => {
            let errors: Vec<FetchError> = [base.err(), sample.err()]
                .into_iter()
                .flatten()
                .collect();
            Err(ReportError::fetch(errors))
        }
    }
}
