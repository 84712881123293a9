use rayon::prelude::*;

use livecalc_core::{ExpenseAssumptions, LapseTable, MortalityTable, PolicySet, ScenarioSet};

use crate::aggregation::{aggregate, ValuationStats};
use crate::config::ProjectionConfig;
use crate::projection::project_policy;

/// Full result of a valuation run: aggregate statistics, optionally the
/// full per-scenario NPV vector, and a count of UDF calls that fell back
/// to the default multiplier.
#[derive(Clone, Debug)]
pub struct ValuationResult {
    pub stats: ValuationStats,
    pub scenario_npvs: Option<Vec<f64>>,
    pub udf_failures: u64,
}

/// Runs the full valuation: for every scenario, sums per-policy NPVs into
/// a scenario NPV, then aggregates the scenario NPVs into summary
/// statistics.
///
/// The outer loop over scenarios is the kernel's only source of
/// parallelism: each scenario's per-policy loop runs
/// sequentially on one worker, and per-scenario NPVs are combined by
/// `rayon`'s fold/reduce rather than under a shared lock.
pub fn run_valuation(
    policies: &PolicySet,
    mortality: &MortalityTable,
    lapse: &LapseTable,
    expense: &ExpenseAssumptions,
    scenarios: &ScenarioSet,
    config: &ProjectionConfig,
) -> ValuationResult {
    let scenario_npvs: Vec<f64> = scenarios
        .as_slice()
        .par_iter()
        .map(|scenario| {
            policies
                .iter()
                .map(|policy| {
                    project_policy(policy, mortality, lapse, expense, scenario, config).npv
                })
                .sum::<f64>()
        })
        .collect();

    let stats = aggregate(&scenario_npvs);
    let udf_failures = config.udf.as_ref().map_or(0, |u| u.failure_count());

    ValuationResult {
        stats,
        scenario_npvs: if config.retain_scenario_npvs {
            Some(scenario_npvs)
        } else {
            None
        },
        udf_failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecalc_core::constants::{LAPSE_TABLE_LEN, MORTALITY_TABLE_LEN, SCENARIO_YEARS};
    use livecalc_core::{Gender, Policy, ProductType, Scenario, UnderwritingClass};

    fn one_policy(age: u8, sum_assured: f64, premium: f64, term: u8) -> PolicySet {
        let policy = Policy::new(
            1,
            age,
            Gender::Male,
            sum_assured,
            premium,
            term,
            ProductType::Term,
            UnderwritingClass::Standard,
        )
        .unwrap();
        PolicySet::from_iter([policy])
    }

    fn flat_tables(qx: f64, lapse_rate: f64) -> (MortalityTable, LapseTable, ExpenseAssumptions) {
        (
            MortalityTable::from_flat(vec![qx; MORTALITY_TABLE_LEN]).unwrap(),
            LapseTable::from_flat(vec![lapse_rate; LAPSE_TABLE_LEN]).unwrap(),
            ExpenseAssumptions::from_flat(&[0.0, 0.0, 0.0, 0.0]).unwrap(),
        )
    }

    fn single_zero_rate_scenario_set() -> ScenarioSet {
        ScenarioSet::new(vec![Scenario::new(0, vec![0.0; SCENARIO_YEARS]).unwrap()])
    }

    #[test]
    fn single_scenario_npv_matches_premium_sum() {
        let policies = one_policy(40, 100_000.0, 1_000.0, 10);
        let (mortality, lapse, expense) = flat_tables(0.0, 0.0);
        let scenarios = single_zero_rate_scenario_set();

        let result = run_valuation(
            &policies,
            &mortality,
            &lapse,
            &expense,
            &scenarios,
            &ProjectionConfig::default(),
        );

        assert!((result.stats.mean - 10_000.0).abs() < 1e-9);
        assert_eq!(result.stats.stddev, 0.0);
        assert!(result.scenario_npvs.is_none());
    }

    #[test]
    fn retains_per_scenario_npvs_when_requested() {
        let policies = one_policy(40, 100_000.0, 1_000.0, 10);
        let (mortality, lapse, expense) = flat_tables(0.0, 0.0);
        let scenarios = single_zero_rate_scenario_set();
        let mut config = ProjectionConfig::default();
        config.retain_scenario_npvs = true;

        let result = run_valuation(&policies, &mortality, &lapse, &expense, &scenarios, &config);

        assert_eq!(result.scenario_npvs.as_deref(), Some(&[10_000.0][..]));
    }

    #[test]
    fn many_scenarios_sum_across_policies() {
        let mut policies = PolicySet::new();
        for id in 0..5u64 {
            let mut policy = Policy::new(
                id,
                45,
                Gender::Female,
                50_000.0,
                600.0,
                15,
                ProductType::Term,
                UnderwritingClass::Standard,
            )
            .unwrap();
            policy.policy_id = id;
            policies.add(policy);
        }
        let (mortality, lapse, expense) = flat_tables(0.001, 0.02);
        let scenarios = ScenarioSet::new(vec![
            Scenario::new(0, vec![0.03; SCENARIO_YEARS]).unwrap(),
            Scenario::new(1, vec![0.05; SCENARIO_YEARS]).unwrap(),
        ]);

        let result = run_valuation(
            &policies,
            &mortality,
            &lapse,
            &expense,
            &scenarios,
            &ProjectionConfig::default(),
        );

        assert!(result.stats.p50.is_finite());
        assert!(result.stats.cte_95 <= result.stats.mean + 1e-6);
    }
}
