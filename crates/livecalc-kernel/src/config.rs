use livecalc_core::constants::DEFAULT_MULTIPLIER;

use crate::udf::UdfContext;

/// Stress multipliers and behavioral knobs for a single valuation run.
#[derive(Clone)]
pub struct ProjectionConfig {
    pub mortality_multiplier: f64,
    pub lapse_multiplier: f64,
    pub expense_multiplier: f64,
    /// Retains the full per-scenario NPV vector on [`crate::ValuationResult`].
    pub retain_scenario_npvs: bool,
    /// Percent of `sum_assured` paid on lapse, subtracted from
    /// `net_cashflow` when non-zero. Surrender benefits are left out of
    /// the default cash-flow model; this knob defaults to `0.0`, which
    /// reproduces that default exactly.
    pub surrender_value_pct: f64,
    pub udf: Option<UdfContext>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            mortality_multiplier: DEFAULT_MULTIPLIER,
            lapse_multiplier: DEFAULT_MULTIPLIER,
            expense_multiplier: DEFAULT_MULTIPLIER,
            retain_scenario_npvs: false,
            surrender_value_pct: 0.0,
            udf: None,
        }
    }
}
