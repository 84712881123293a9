use serde::{Deserialize, Serialize};

use crate::constants::SCENARIO_YEARS;
use crate::error::CoreError;

/// A single stochastic economic scenario: one discount rate per projection
/// year. Generation lives in `livecalc-kernel`; this type only carries the
/// resulting data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub index: usize,
    rates: Vec<f64>,
}

impl Scenario {
    pub fn new(index: usize, rates: Vec<f64>) -> Result<Self, CoreError> {
        if rates.len() != SCENARIO_YEARS {
            return Err(CoreError::ScenarioYearOutOfRange {
                year: rates.len() as u8,
            });
        }
        Ok(Self { index, rates })
    }

    /// Discount rate for `year` (1-based). Years beyond the scenario's
    /// horizon reuse the final year's rate.
    pub fn rate(&self, year: u8) -> f64 {
        let year = year.max(1) as usize;
        let idx = (year - 1).min(self.rates.len() - 1);
        self.rates[idx]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.rates
    }
}

/// An ordered collection of scenarios produced by a single generation call,
/// sharing a seed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.scenarios.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scenario> {
        self.scenarios.iter()
    }

    pub fn as_slice(&self) -> &[Scenario] {
        &self.scenarios
    }
}

impl<'a> IntoIterator for &'a ScenarioSet {
    type Item = &'a Scenario;
    type IntoIter = std::slice::Iter<'a, Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = Scenario::new(0, vec![0.03; 10]).unwrap_err();
        assert!(matches!(err, CoreError::ScenarioYearOutOfRange { .. }));
    }

    #[test]
    fn rate_clamps_past_horizon_to_final_year() {
        let mut rates = vec![0.03; SCENARIO_YEARS];
        rates[SCENARIO_YEARS - 1] = 0.07;
        let scenario = Scenario::new(0, rates).unwrap();
        assert_eq!(scenario.rate(SCENARIO_YEARS as u8), 0.07);
        assert_eq!(scenario.rate(SCENARIO_YEARS as u8 + 10), 0.07);
    }

    #[test]
    fn rate_year_zero_uses_first_year() {
        let mut rates = vec![0.03; SCENARIO_YEARS];
        rates[0] = 0.02;
        let scenario = Scenario::new(0, rates).unwrap();
        assert_eq!(scenario.rate(0), 0.02);
    }
}
