use livecalc_core::constants::SCENARIO_YEARS;
use livecalc_core::scenario::{Scenario, ScenarioSet};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Parameters for geometric-Brownian-motion scenario generation.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioGeneratorParams {
    pub initial_rate: f64,
    pub drift: f64,
    pub volatility: f64,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for ScenarioGeneratorParams {
    fn default() -> Self {
        Self {
            initial_rate: 0.03,
            drift: 0.0,
            volatility: 0.01,
            min_rate: 0.0,
            max_rate: 0.20,
        }
    }
}

/// Mixes a run seed with a scenario index into an independent per-scenario
/// seed (splitmix64), so that scenario `i`'s rate path depends only on
/// `(seed, i)` and never on how many scenarios were requested overall —
/// this is what makes `generate_scenarios` prefix-stable.
fn derive_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed.wrapping_add((index as u64).wrapping_mul(0x9E3779B97F4A7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn generate_one(index: usize, seed: u64, params: &ScenarioGeneratorParams) -> Scenario {
    let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, index));
    let mut rates = Vec::with_capacity(SCENARIO_YEARS);
    let mut prev = params.initial_rate;

    for _ in 0..SCENARIO_YEARS {
        let z: f64 = StandardNormal.sample(&mut rng);
        let drift_term = params.drift - 0.5 * params.volatility * params.volatility;
        let next = prev * (drift_term + params.volatility * z).exp();
        let clamped = next.clamp(params.min_rate, params.max_rate);
        rates.push(clamped);
        prev = clamped;
    }

    Scenario::new(index, rates).expect("generated rates always have SCENARIO_YEARS entries")
}

/// Generates `num_scenarios` independent rate paths. Two calls with the
/// same `seed`/`params`/`num_scenarios` produce bit-identical output, and
/// scenario `i` is identical whether `num_scenarios` is `N` or `N+k`.
pub fn generate_scenarios(
    num_scenarios: usize,
    params: &ScenarioGeneratorParams,
    seed: u64,
) -> ScenarioSet {
    let scenarios = (0..num_scenarios)
        .map(|i| generate_one(i, seed, params))
        .collect();
    ScenarioSet::new(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_same_seed_and_params() {
        let params = ScenarioGeneratorParams::default();
        let a = generate_scenarios(5, &params, 42);
        let b = generate_scenarios(5, &params, 42);
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.as_slice(), sb.as_slice());
        }
    }

    #[test]
    fn prefix_stable_across_scenario_counts() {
        let params = ScenarioGeneratorParams::default();
        let small = generate_scenarios(5, &params, 42);
        let large = generate_scenarios(50, &params, 42);
        for i in 0..5 {
            assert_eq!(small.get(i).unwrap().as_slice(), large.get(i).unwrap().as_slice());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let params = ScenarioGeneratorParams::default();
        let a = generate_scenarios(1, &params, 1);
        let b = generate_scenarios(1, &params, 2);
        assert_ne!(a.get(0).unwrap().as_slice(), b.get(0).unwrap().as_slice());
    }

    #[test]
    fn rates_stay_within_bounds() {
        let params = ScenarioGeneratorParams {
            initial_rate: 0.03,
            drift: 0.1,
            volatility: 0.5,
            min_rate: 0.0,
            max_rate: 0.1,
        };
        let scenarios = generate_scenarios(20, &params, 7);
        for scenario in scenarios.iter() {
            for &rate in scenario.as_slice() {
                assert!((0.0..=0.1).contains(&rate));
            }
        }
    }
}
