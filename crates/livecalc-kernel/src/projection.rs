use livecalc_core::constants::LIVES_EPSILON;
use livecalc_core::{ExpenseAssumptions, LapseTable, MortalityTable, Policy, Scenario};

use crate::config::ProjectionConfig;
use crate::udf::UdfYearState;

/// Result of projecting one policy against one scenario.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicyProjection {
    pub npv: f64,
    /// `lives` remaining when the loop stopped (term exhausted or decayed
    /// below [`LIVES_EPSILON`]); always `>= 0`.
    pub final_lives: f64,
    /// Last policy year the loop actually ran.
    pub years_projected: u8,
}

/// Projects a single policy under a single economic scenario.
/// Mortality and lapse rates are clamped into `[0, 1]` at every
/// step; `lives` is non-increasing and never negative.
pub fn project_policy(
    policy: &Policy,
    mortality: &MortalityTable,
    lapse: &LapseTable,
    expense: &ExpenseAssumptions,
    scenario: &Scenario,
    config: &ProjectionConfig,
) -> PolicyProjection {
    let mut lives = 1.0_f64;
    let mut npv = 0.0_f64;
    let mut discount_factor = 1.0_f64;
    let mut year: u8 = 0;

    while year < policy.term && lives > LIVES_EPSILON {
        year += 1;
        let rate = scenario.rate(year);

        let age_at_year = (policy.age as u16 + (year as u16 - 1)).min(120) as u8;
        let state = UdfYearState { year, lives, rate };

        let mut qx = mortality.qx(age_at_year, policy.gender) * config.mortality_multiplier;
        if let Some(udf) = &config.udf {
            qx *= udf.adjust_mortality(policy, state);
        }
        let qx = qx.clamp(0.0, 1.0);

        let mut lapse_rate = lapse.rate(year) * config.lapse_multiplier;
        if let Some(udf) = &config.udf {
            lapse_rate *= udf.adjust_lapse(policy, state);
        }
        let lapse_rate = lapse_rate.clamp(0.0, 1.0);

        let deaths = qx * lives;
        let surviving_after_deaths = lives - deaths;
        let lapses = lapse_rate * surviving_after_deaths;

        let premium_income = policy.premium * lives;
        let death_benefit = deaths * policy.sum_assured;
        let base_expense = if year == 1 {
            expense.first_year_expense(policy.premium)
        } else {
            expense.renewal_expense(policy.premium)
        };
        let expenses = base_expense * lives * config.expense_multiplier;

        let mut net_cashflow = premium_income - death_benefit - expenses;
        if config.surrender_value_pct > 0.0 {
            net_cashflow -= lapses * config.surrender_value_pct * policy.sum_assured;
        }

        discount_factor *= 1.0 / (1.0 + rate);
        npv += net_cashflow * discount_factor;

        lives = (lives - deaths - lapses).max(0.0);
    }

    PolicyProjection {
        npv,
        final_lives: lives,
        years_projected: year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecalc_core::constants::{LAPSE_TABLE_LEN, MORTALITY_TABLE_LEN, SCENARIO_YEARS};
    use livecalc_core::{Gender, ProductType, UnderwritingClass};

    fn flat_policy(age: u8, sum_assured: f64, premium: f64, term: u8) -> Policy {
        Policy::new(
            1,
            age,
            Gender::Male,
            sum_assured,
            premium,
            term,
            ProductType::Term,
            UnderwritingClass::Standard,
        )
        .unwrap()
    }

    fn zero_rate_scenario() -> Scenario {
        Scenario::new(0, vec![0.0; SCENARIO_YEARS]).unwrap()
    }

    fn flat_tables(qx: f64, lapse_rate: f64) -> (MortalityTable, LapseTable, ExpenseAssumptions) {
        (
            MortalityTable::from_flat(vec![qx; MORTALITY_TABLE_LEN]).unwrap(),
            LapseTable::from_flat(vec![lapse_rate; LAPSE_TABLE_LEN]).unwrap(),
            ExpenseAssumptions::from_flat(&[0.0, 0.0, 0.0, 0.0]).unwrap(),
        )
    }

    /// Pure-term policy, zero rates, zero decrements — NPV is exactly the
    /// undiscounted premium stream.
    #[test]
    fn pure_term_zero_rates_matches_premium_sum() {
        let policy = flat_policy(40, 100_000.0, 1_000.0, 10);
        let (mortality, lapse, expense) = flat_tables(0.0, 0.0);
        let scenario = zero_rate_scenario();
        let result = project_policy(
            &policy,
            &mortality,
            &lapse,
            &expense,
            &scenario,
            &ProjectionConfig::default(),
        );
        assert!((result.npv - 10_000.0).abs() < 1e-9);
    }

    /// Certain death in year 1 dominates the whole NPV.
    #[test]
    fn certain_death_first_year() {
        let policy = flat_policy(50, 200_000.0, 500.0, 5);
        let (mortality, lapse, expense) = flat_tables(1.0, 0.0);
        let scenario = zero_rate_scenario();
        let result = project_policy(
            &policy,
            &mortality,
            &lapse,
            &expense,
            &scenario,
            &ProjectionConfig::default(),
        );
        assert!((result.npv - (-199_500.0)).abs() < 1e-9);
        assert_eq!(result.years_projected, 1);
        assert_eq!(result.final_lives, 0.0);
    }

    #[test]
    fn lives_never_negative_and_non_increasing() {
        let policy = flat_policy(60, 50_000.0, 2_000.0, 30);
        let (mortality, lapse, expense) = flat_tables(0.05, 0.03);
        let scenario = Scenario::new(0, vec![0.03; SCENARIO_YEARS]).unwrap();
        let result = project_policy(
            &policy,
            &mortality,
            &lapse,
            &expense,
            &scenario,
            &ProjectionConfig::default(),
        );
        assert!(result.final_lives >= 0.0);
        assert!(result.final_lives <= 1.0);
    }

    #[test]
    fn qx_clamped_even_with_overstressed_multiplier() {
        let policy = flat_policy(30, 10_000.0, 100.0, 2);
        let (mortality, lapse, expense) = flat_tables(0.8, 0.0);
        let scenario = zero_rate_scenario();
        let mut config = ProjectionConfig::default();
        config.mortality_multiplier = 5.0; // would push qx to 4.0 without clamping
        let result = project_policy(&policy, &mortality, &lapse, &expense, &scenario, &config);
        // fully exhausted in year 1 since clamped qx = 1.0
        assert_eq!(result.years_projected, 1);
        assert_eq!(result.final_lives, 0.0);
    }

    #[test]
    fn age_beyond_120_clamps_to_table_ceiling() {
        let policy = flat_policy(119, 10_000.0, 100.0, 5);
        let (mortality, lapse, expense) = flat_tables(0.0, 0.0);
        let scenario = zero_rate_scenario();
        let result = project_policy(
            &policy,
            &mortality,
            &lapse,
            &expense,
            &scenario,
            &ProjectionConfig::default(),
        );
        // does not panic on out-of-range table index past age 120
        assert!(result.years_projected > 0);
    }
}
