use livecalc_core::constants::{
    EXPENSE_TABLE_LEN, LAPSE_TABLE_LEN, MORTALITY_TABLE_LEN,
};
use livecalc_core::{ExpenseAssumptions, Gender, LapseTable, MortalityTable, Policy, PolicySet, ProductType, UnderwritingClass};
use livecalc_kernel::{run_valuation, ProjectionConfig, ScenarioGeneratorParams, generate_scenarios};

fn flat_tables(qx: f64, lapse_rate: f64) -> (MortalityTable, LapseTable, ExpenseAssumptions) {
    (
        MortalityTable::from_flat(vec![qx; MORTALITY_TABLE_LEN]).unwrap(),
        LapseTable::from_flat(vec![lapse_rate; LAPSE_TABLE_LEN]).unwrap(),
        ExpenseAssumptions::from_flat(&[0.0; EXPENSE_TABLE_LEN]).unwrap(),
    )
}

fn term_policy(id: u64, age: u8) -> Policy {
    Policy::new(
        id,
        age,
        Gender::Male,
        100_000.0,
        1_200.0,
        20,
        ProductType::Term,
        UnderwritingClass::Standard,
    )
    .unwrap()
}

/// A portfolio run reuses the exact same scenario rates as a superset
/// portfolio run, for the indices they share — the kernel never mixes
/// scenario generation into per-policy state.
#[test]
fn scenario_rates_are_shared_across_portfolio_sizes() {
    let params = ScenarioGeneratorParams::default();
    let scenarios_small = generate_scenarios(100, &params, 42);
    let scenarios_large = generate_scenarios(1_000, &params, 42);

    for i in 0..100 {
        assert_eq!(
            scenarios_small.get(i).unwrap().as_slice(),
            scenarios_large.get(i).unwrap().as_slice()
        );
    }

    let (mortality, lapse, expense) = flat_tables(0.01, 0.02);
    let small_portfolio = PolicySet::from_iter([term_policy(1, 40)]);
    let large_portfolio = PolicySet::from_iter([term_policy(1, 40), term_policy(2, 55)]);

    let small_result = run_valuation(
        &small_portfolio,
        &mortality,
        &lapse,
        &expense,
        &scenarios_small,
        &ProjectionConfig::default(),
    );
    let large_result = run_valuation(
        &large_portfolio,
        &mortality,
        &lapse,
        &expense,
        &scenarios_large,
        &ProjectionConfig::default(),
    );

    // The larger portfolio adds a second (higher-mortality-exposure)
    // policy on top of the same first policy, so its mean NPV must differ,
    // but both runs must still produce finite, ordered percentiles.
    assert!(small_result.stats.mean.is_finite());
    assert!(large_result.stats.mean.is_finite());
    assert!(large_result.stats.p50 <= large_result.stats.p99);
}

#[test]
fn deterministic_rerun_produces_identical_statistics() {
    let params = ScenarioGeneratorParams::default();
    let scenarios_a = generate_scenarios(200, &params, 7);
    let scenarios_b = generate_scenarios(200, &params, 7);

    let (mortality, lapse, expense) = flat_tables(0.01, 0.03);
    let policies = PolicySet::from_iter([term_policy(1, 35), term_policy(2, 60)]);

    let result_a = run_valuation(
        &policies,
        &mortality,
        &lapse,
        &expense,
        &scenarios_a,
        &ProjectionConfig::default(),
    );
    let result_b = run_valuation(
        &policies,
        &mortality,
        &lapse,
        &expense,
        &scenarios_b,
        &ProjectionConfig::default(),
    );

    assert_eq!(result_a.stats, result_b.stats);
}
