//! Fisher's exact test over a 2x2 contingency table, by hypergeometric
//! summation in log space. The engine consumes only the directional
//! right-tail probability, but all three tails are reported.

/// Exceedance probabilities for the observed table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FisherTails {
    /// P(tables at least as small in the top-left cell).
    pub left: f64,
    /// P(tables at least as large in the top-left cell).
    pub right: f64,
    /// Sum of all table probabilities no larger than the observed one.
    pub two_tail: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("empty contingency table")]
    EmptyTable,
}

/// Exact test for the table [[a, b], [c, d]] with fixed margins.
pub fn fisher_exact(a: u32, b: u32, c: u32, d: u32) -> Result<FisherTails, StatsError> {
    let (a, b, c, d) = (a as usize, b as usize, c as usize, d as usize);
    let n = a + b + c + d;
    if n == 0 {
        return Err(StatsError::EmptyTable);
    }

    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let ln_fact = ln_factorials(n);

    // P(x in top-left) for the fixed margins, in log space.
    let ln_p = |x: usize| -> f64 {
        ln_choose(&ln_fact, row1, x) + ln_choose(&ln_fact, row2, col1 - x)
            - ln_choose(&ln_fact, n, col1)
    };

    let lo = col1.saturating_sub(row2);
    let hi = row1.min(col1);
    let observed = a;
    let p_observed = ln_p(observed).exp();

    let mut left = 0.0;
    let mut right = 0.0;
    let mut two_tail = 0.0;
    // Relative tolerance absorbs log-space rounding when comparing table
    // probabilities for the two-tail sum.
    let cutoff = p_observed * (1.0 + 1e-7);
    for x in lo..=hi {
        let p = ln_p(x).exp();
        if x <= observed {
            left += p;
        }
        if x >= observed {
            right += p;
        }
        if p <= cutoff {
            two_tail += p;
        }
    }

    Ok(FisherTails {
        left: left.min(1.0),
        right: right.min(1.0),
        two_tail: two_tail.min(1.0),
    })
}

fn ln_factorials(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    table.push(0.0);
    let mut acc = 0.0;
    for i in 1..=n {
        acc += (i as f64).ln();
        table.push(acc);
    }
    table
}

fn ln_choose(ln_fact: &[f64], n: usize, k: usize) -> f64 {
    ln_fact[n] - ln_fact[k] - ln_fact[n - k]
}
