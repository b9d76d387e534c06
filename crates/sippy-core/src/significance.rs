//! Significance calculator: classifies one test's pass-rate movement
//! between the base and sample windows.

use crate::model::Verdict;
use crate::request::AdvancedOptions;
use crate::stats::fisher_exact;

/// Counts for one test within one release window. Flakes count as passes
/// for the rates; failures are derived and floored at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: u32,
    pub success: u32,
    pub flake: u32,
}

impl Counts {
    pub fn new(total: u32, success: u32, flake: u32) -> Self {
        Counts {
            total,
            success,
            flake,
        }
    }

    pub fn pass(&self) -> u32 {
        self.success.saturating_add(self.flake)
    }

    pub fn failure(&self) -> u32 {
        self.total.saturating_sub(self.pass())
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.pass()) / f64::from(self.total)
        }
    }

    /// Remove `runs` documented job runs from the window. The suppressed
    /// runs are failures by construction, so the total drops while the
    /// pass counts stay intact (floored so failures never go negative).
    pub fn discount_runs(&mut self, runs: u32) {
        let floor = self.pass().min(self.total);
        self.total = self.total.saturating_sub(runs).max(floor);
    }
}

/// A pass-rate drop of more than 15 points turns a significant regression
/// into an extreme one.
const EXTREME_DROP: f64 = 0.15;

/// Classify the sample window against the base window. Returns the verdict
/// and, when a Fisher test ran, its right-tail probability.
pub fn assess(sample: Counts, base: Counts, options: &AdvancedOptions) -> (Verdict, f64) {
    if base.total == 0 {
        return (Verdict::MissingBasis, 0.0);
    }
    if sample.total == 0 {
        if options.ignore_missing {
            return (Verdict::NotSignificant, 0.0);
        }
        return (Verdict::MissingSample, 0.0);
    }
    // A regression must clear an absolute failure floor before it is even
    // tested; one-off failures on tiny samples are noise, not signal.
    if options.minimum_failure > 0 && sample.failure() < options.minimum_failure {
        return (Verdict::NotSignificant, 0.0);
    }

    let base_rate = base.pass_rate();
    let sample_rate = sample.pass_rate();
    let improved = sample_rate >= base_rate;
    let threshold = 1.0 - f64::from(options.confidence) / 100.0;

    let mut significant = false;
    let mut p = 0.0;
    if improved {
        if let Ok(tails) = fisher_exact(base.failure(), base.pass(), sample.failure(), sample.pass())
        {
            p = tails.right;
            significant = p < threshold;
        }
    } else if base_rate - sample_rate > f64::from(options.pity_factor) / 100.0 {
        if let Ok(tails) = fisher_exact(sample.failure(), sample.pass(), base.failure(), base.pass())
        {
            p = tails.right;
            significant = p < threshold;
        }
    }
    // else: the regression stays inside the pity band and is never tested.

    let verdict = if significant {
        if improved {
            Verdict::SignificantImprovement
        } else if base_rate - sample_rate > EXTREME_DROP {
            Verdict::ExtremeRegression
        } else {
            Verdict::SignificantRegression
        }
    } else {
        Verdict::NotSignificant
    };
    (verdict, p)
}
