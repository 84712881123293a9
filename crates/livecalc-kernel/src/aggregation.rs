/// Distribution statistics over per-scenario NPVs.
#[derive(Clone, Debug, PartialEq)]
pub struct ValuationStats {
    pub mean: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    /// Mean of the worst 5% of scenario outcomes (conditional tail
    /// expectation at the 95% level).
    pub cte_95: f64,
}

/// Aggregates `scenario_npvs` (one total NPV per scenario, across all
/// policies) into mean/stddev/percentile/CTE-95 statistics. Percentiles
/// use linear interpolation between sorted neighbours.
///
/// # Panics
/// Panics if `scenario_npvs` is empty — a valuation run always has at
/// least one scenario.
pub fn aggregate(scenario_npvs: &[f64]) -> ValuationStats {
    assert!(!scenario_npvs.is_empty(), "at least one scenario is required");

    let n = scenario_npvs.len();
    let mean = scenario_npvs.iter().sum::<f64>() / n as f64;

    let stddev = if n > 1 {
        let variance = scenario_npvs
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    let mut sorted = scenario_npvs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("NPVs must not be NaN"));

    ValuationStats {
        mean,
        stddev,
        p50: percentile(&sorted, 50.0),
        p75: percentile(&sorted, 75.0),
        p90: percentile(&sorted, 90.0),
        p95: percentile(&sorted, 95.0),
        p99: percentile(&sorted, 99.0),
        cte_95: cte_95(&sorted),
    }
}

/// Linear interpolation between sorted neighbours, matching the common
/// "R-7" percentile definition (`numpy.percentile`'s default).
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Mean of the worst (smallest) 5% of sorted outcomes; at least one
/// scenario always contributes.
fn cte_95(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let tail_count = ((n as f64 * 0.05).ceil() as usize).max(1);
    let tail = &sorted[..tail_count];
    tail.iter().sum::<f64>() / tail_count as f64
}
