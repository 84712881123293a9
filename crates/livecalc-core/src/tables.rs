use crate::constants::{
    EXPENSE_TABLE_LEN, LAPSE_TABLE_LEN, MORTALITY_FEMALE_OFFSET, MORTALITY_TABLE_LEN,
};
use crate::error::CoreError;
use crate::types::Gender;

/// Mortality table: qx by age (0..=120) and gender, stored flat as
/// `[Male ages 0..=120, Female ages 0..=120]`.
#[derive(Clone, Debug)]
pub struct MortalityTable {
    data: Vec<f64>,
}

impl MortalityTable {
    pub fn from_flat(data: Vec<f64>) -> Result<Self, CoreError> {
        if data.len() != MORTALITY_TABLE_LEN {
            return Err(CoreError::MortalityTableWrongLength {
                expected: MORTALITY_TABLE_LEN,
                got: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// qx for the given age and gender, clamped into `[0, 1]`.
    pub fn qx(&self, age: u8, gender: Gender) -> f64 {
        let offset = match gender {
            Gender::Male => 0,
            Gender::Female => MORTALITY_FEMALE_OFFSET,
        };
        let idx = offset + age as usize;
        self.data.get(idx).copied().unwrap_or(0.0).clamp(0.0, 1.0)
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.data
    }
}

/// Lapse table: voluntary-termination probability by policy year 1..=50.
#[derive(Clone, Debug)]
pub struct LapseTable {
    data: Vec<f64>,
}

impl LapseTable {
    pub fn from_flat(data: Vec<f64>) -> Result<Self, CoreError> {
        if data.len() != LAPSE_TABLE_LEN {
            return Err(CoreError::LapseTableWrongLength {
                expected: LAPSE_TABLE_LEN,
                got: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// Lapse rate for `year` (1-based), clamped into `[0, 1]`.
    pub fn rate(&self, year: u8) -> f64 {
        if year == 0 {
            return 0.0;
        }
        self.data
            .get(year as usize - 1)
            .copied()
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.data
    }
}

/// Expense assumptions: four scalars.
#[derive(Clone, Copy, Debug)]
pub struct ExpenseAssumptions {
    /// One-time per-policy acquisition expense.
    pub acquisition: f64,
    /// Annual per-policy maintenance expense.
    pub maintenance: f64,
    /// Percent-of-premium expense, in `[0, 1]`.
    pub pct_premium: f64,
    /// Per-claim cost.
    pub per_claim: f64,
}

impl ExpenseAssumptions {
    pub fn from_flat(data: &[f64]) -> Result<Self, CoreError> {
        if data.len() != EXPENSE_TABLE_LEN {
            return Err(CoreError::ExpenseTableWrongLength {
                expected: EXPENSE_TABLE_LEN,
                got: data.len(),
            });
        }
        Ok(Self {
            acquisition: data[0],
            maintenance: data[1],
            pct_premium: data[2],
            per_claim: data[3],
        })
    }

    pub fn as_flat(&self) -> [f64; EXPENSE_TABLE_LEN] {
        [
            self.acquisition,
            self.maintenance,
            self.pct_premium,
            self.per_claim,
        ]
    }

    /// First-year expense for a policy with the given premium:
    /// `acquisition + maintenance + pct_premium * premium`.
    pub fn first_year_expense(&self, premium: f64) -> f64 {
        self.acquisition + self.maintenance + self.pct_premium * premium
    }

    /// Renewal-year expense: `maintenance + pct_premium * premium`.
    pub fn renewal_expense(&self, premium: f64) -> f64 {
        self.maintenance + self.pct_premium * premium
    }
}
