//! Fixed-stride binary record layouts at the orchestrator/engine boundary.
//! Engines exchange policies, scenario cells, and results as flat
//! little-endian byte buffers rather than Rust-internal serialization.

use std::collections::BTreeMap;

use livecalc_core::{Gender, Policy, ProductType, Scenario, ScenarioSet, UnderwritingClass};

use crate::error::OrchestratorError;

pub const POLICY_RECORD_LEN: usize = 32;
pub const SCENARIO_CELL_RECORD_LEN: usize = 16;
pub const RESULT_RECORD_LEN: usize = 32;

/// One 32-byte input policy record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicyRecord {
    pub policy_id: u64,
    pub age: u8,
    pub gender: u8,
    pub underwriting_class: u8,
    pub product_type: u8,
    pub sum_assured: f64,
    pub premium: f64,
}

impl PolicyRecord {
    pub fn decode(bytes: &[u8; POLICY_RECORD_LEN]) -> Self {
        Self {
            policy_id: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            age: bytes[8],
            gender: bytes[9],
            underwriting_class: bytes[10],
            product_type: bytes[11],
            // bytes[12..16] are padding.
            sum_assured: f64::from_le_bytes(bytes[16..24].try_into().unwrap()),
            premium: f64::from_le_bytes(bytes[24..32].try_into().unwrap()),
        }
    }

    pub fn encode(&self) -> [u8; POLICY_RECORD_LEN] {
        let mut out = [0u8; POLICY_RECORD_LEN];
        out[0..8].copy_from_slice(&self.policy_id.to_le_bytes());
        out[8] = self.age;
        out[9] = self.gender;
        out[10] = self.underwriting_class;
        out[11] = self.product_type;
        out[16..24].copy_from_slice(&self.sum_assured.to_le_bytes());
        out[24..32].copy_from_slice(&self.premium.to_le_bytes());
        out
    }

    /// Converts to a [`Policy`] with a default term, since the fixed
    /// 32-byte record has no term field of its own — callers that need a
    /// non-default term carry it out-of-band (e.g. alongside the buffer)
    /// and overwrite the default after conversion.
    pub fn to_policy(self, index: usize, default_term: u8) -> Result<Policy, OrchestratorError> {
        let gender = Gender::from_u8(self.gender).map_err(|_| OrchestratorError::InvalidRecordField {
            field: "gender",
            value: self.gender,
            index,
        })?;
        let underwriting_class = UnderwritingClass::from_u8(self.underwriting_class).map_err(|_| {
            OrchestratorError::InvalidRecordField {
                field: "underwriting_class",
                value: self.underwriting_class,
                index,
            }
        })?;
        let product_type = ProductType::from_u8(self.product_type).map_err(|_| {
            OrchestratorError::InvalidRecordField {
                field: "product_type",
                value: self.product_type,
                index,
            }
        })?;

        Policy::new(
            self.policy_id,
            self.age,
            gender,
            self.sum_assured,
            self.premium,
            default_term,
            product_type,
            underwriting_class,
        )
        .map_err(|e| OrchestratorError::InitializationFailed(e.to_string()))
    }
}

/// Decodes a raw input buffer into policy records. The buffer length must
/// be a multiple of [`POLICY_RECORD_LEN`].
pub fn decode_policy_buffer(bytes: &[u8]) -> Result<Vec<PolicyRecord>, OrchestratorError> {
    if bytes.len() % POLICY_RECORD_LEN != 0 {
        return Err(OrchestratorError::MisalignedBuffer {
            expected: POLICY_RECORD_LEN,
            got: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(POLICY_RECORD_LEN)
        .map(|chunk| PolicyRecord::decode(chunk.try_into().unwrap()))
        .collect())
}

/// One 16-byte scenario-cell record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScenarioCellRecord {
    pub scenario_id: u32,
    pub year: u32,
    pub rate: f64,
}

impl ScenarioCellRecord {
    pub fn decode(bytes: &[u8; SCENARIO_CELL_RECORD_LEN]) -> Self {
        Self {
            scenario_id: u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            year: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            rate: f64::from_le_bytes(bytes[8..16].try_into().unwrap()),
        }
    }

    pub fn encode(&self) -> [u8; SCENARIO_CELL_RECORD_LEN] {
        let mut out = [0u8; SCENARIO_CELL_RECORD_LEN];
        out[0..4].copy_from_slice(&self.scenario_id.to_le_bytes());
        out[4..8].copy_from_slice(&self.year.to_le_bytes());
        out[8..16].copy_from_slice(&self.rate.to_le_bytes());
        out
    }
}

/// Decodes a raw scenario-cell buffer and regroups it into a
/// [`ScenarioSet`] ordered by `scenario_id`. Cells for a scenario are
/// sorted by `year` before being packed into that scenario's rate vector.
pub fn decode_scenario_buffer(bytes: &[u8]) -> Result<ScenarioSet, OrchestratorError> {
    if bytes.len() % SCENARIO_CELL_RECORD_LEN != 0 {
        return Err(OrchestratorError::MisalignedBuffer {
            expected: SCENARIO_CELL_RECORD_LEN,
            got: bytes.len(),
        });
    }

    let cells: Vec<ScenarioCellRecord> = bytes
        .chunks_exact(SCENARIO_CELL_RECORD_LEN)
        .map(|chunk| ScenarioCellRecord::decode(chunk.try_into().unwrap()))
        .collect();

    let mut by_scenario: BTreeMap<u32, Vec<(u32, f64)>> = BTreeMap::new();
    for cell in cells {
        by_scenario
            .entry(cell.scenario_id)
            .or_default()
            .push((cell.year, cell.rate));
    }

    let mut scenarios = Vec::with_capacity(by_scenario.len());
    for (index, (_, mut years)) in by_scenario.into_iter().enumerate() {
        years.sort_by_key(|(year, _)| *year);
        let rates: Vec<f64> = years.into_iter().map(|(_, rate)| rate).collect();
        let scenario = Scenario::new(index, rates)
            .map_err(|e| OrchestratorError::InitializationFailed(e.to_string()))?;
        scenarios.push(scenario);
    }

    Ok(ScenarioSet::new(scenarios))
}

/// One 32-byte result record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResultRecord {
    pub scenario_id: u32,
    pub policy_id: u32,
    pub npv: f64,
}

impl ResultRecord {
    pub fn encode(&self) -> [u8; RESULT_RECORD_LEN] {
        let mut out = [0u8; RESULT_RECORD_LEN];
        out[0..4].copy_from_slice(&self.scenario_id.to_le_bytes());
        out[4..8].copy_from_slice(&self.policy_id.to_le_bytes());
        out[8..16].copy_from_slice(&self.npv.to_le_bytes());
        // out[16..32] reserved, left zeroed.
        out
    }

    pub fn decode(bytes: &[u8; RESULT_RECORD_LEN]) -> Self {
        Self {
            scenario_id: u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            policy_id: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            npv: f64::from_le_bytes(bytes[8..16].try_into().unwrap()),
        }
    }
}

/// Encodes a slice of results into a flat output buffer.
pub fn encode_result_buffer(records: &[ResultRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * RESULT_RECORD_LEN);
    for record in records {
        out.extend_from_slice(&record.encode());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_record_round_trips() {
        let record = PolicyRecord {
            policy_id: 42,
            age: 40,
            gender: 0,
            underwriting_class: 2,
            product_type: 1,
            sum_assured: 100_000.0,
            premium: 1_200.5,
        };
        let bytes = record.encode();
        assert_eq!(bytes.len(), POLICY_RECORD_LEN);
        assert_eq!(PolicyRecord::decode(&bytes), record);
    }

    #[test]
    fn decode_policy_buffer_rejects_misaligned_length() {
        let err = decode_policy_buffer(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, OrchestratorError::MisalignedBuffer { .. }));
    }

    #[test]
    fn result_record_round_trips_and_zeroes_reserved() {
        let record = ResultRecord {
            scenario_id: 3,
            policy_id: 7,
            npv: -1234.5,
        };
        let bytes = record.encode();
        assert_eq!(&bytes[16..32], &[0u8; 16]);
        assert_eq!(ResultRecord::decode(&bytes), record);
    }

    #[test]
    fn scenario_buffer_regroups_and_sorts_by_year() {
        use livecalc_core::constants::SCENARIO_YEARS;

        let mut cells = Vec::new();
        // scenario 0: years fed out of order, rate = 0.01 * year.
        for year in (1..=SCENARIO_YEARS as u32).rev() {
            cells.push(ScenarioCellRecord { scenario_id: 0, year, rate: 0.01 * year as f64 });
        }
        // scenario 1: flat 0.05 every year.
        for year in 1..=SCENARIO_YEARS as u32 {
            cells.push(ScenarioCellRecord { scenario_id: 1, year, rate: 0.05 });
        }

        let mut bytes = Vec::new();
        for cell in &cells {
            bytes.extend_from_slice(&cell.encode());
        }
        let scenario_set = decode_scenario_buffer(&bytes).unwrap();
        assert_eq!(scenario_set.len(), 2);
        assert_eq!(scenario_set.get(0).unwrap().rate(1), 0.01);
        assert_eq!(scenario_set.get(0).unwrap().rate(2), 0.02);
        assert_eq!(scenario_set.get(1).unwrap().rate(10), 0.05);
    }
}
