use std::path::Path;

use crate::constants::{EXPENSE_TABLE_LEN, LAPSE_TABLE_LEN, MORTALITY_AGES_PER_GENDER};
use crate::error::CoreError;
use crate::tables::{ExpenseAssumptions, LapseTable, MortalityTable};
use crate::types::{Gender, Policy, PolicySet, ProductType};

fn open(path: impl AsRef<Path>) -> Result<csv::Reader<std::fs::File>, CoreError> {
    let path = path.as_ref();
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CoreError::Io {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })
}

fn parse_f64(path: &str, field: &str, raw: &str) -> Result<f64, CoreError> {
    raw.parse::<f64>().map_err(|_| CoreError::CsvParse {
        path: path.to_string(),
        detail: format!("{field} is not a valid number: {raw:?}"),
    })
}

/// Loads a mortality table from a CSV with header `age,male_qx,female_qx`.
/// Rows may appear in any order or be sparse; missing ages default to
/// `0.0`.
pub fn load_mortality_table(path: impl AsRef<Path>) -> Result<MortalityTable, CoreError> {
    let path_str = path.as_ref().display().to_string();
    let mut reader = open(&path)?;
    let mut data = vec![0.0_f64; MORTALITY_AGES_PER_GENDER * 2];

    for record in reader.records() {
        let record = record.map_err(|e| CoreError::CsvParse {
            path: path_str.clone(),
            detail: e.to_string(),
        })?;
        if record.len() < 3 {
            return Err(CoreError::CsvParse {
                path: path_str.clone(),
                detail: format!("expected 3 columns, got {}", record.len()),
            });
        }
        let age: usize = record[0].parse().map_err(|_| CoreError::CsvParse {
            path: path_str.clone(),
            detail: format!("age is not a valid integer: {:?}", &record[0]),
        })?;
        if age >= MORTALITY_AGES_PER_GENDER {
            return Err(CoreError::CsvParse {
                path: path_str.clone(),
                detail: format!("age {age} out of range"),
            });
        }
        data[age] = parse_f64(&path_str, "male_qx", &record[1])?;
        data[MORTALITY_AGES_PER_GENDER + age] = parse_f64(&path_str, "female_qx", &record[2])?;
    }

    MortalityTable::from_flat(data)
}

/// Loads a lapse table from a CSV with header `year,lapse_rate`.
pub fn load_lapse_table(path: impl AsRef<Path>) -> Result<LapseTable, CoreError> {
    let path_str = path.as_ref().display().to_string();
    let mut reader = open(&path)?;
    let mut data = vec![0.0_f64; LAPSE_TABLE_LEN];

    for record in reader.records() {
        let record = record.map_err(|e| CoreError::CsvParse {
            path: path_str.clone(),
            detail: e.to_string(),
        })?;
        if record.len() < 2 {
            return Err(CoreError::CsvParse {
                path: path_str.clone(),
                detail: format!("expected 2 columns, got {}", record.len()),
            });
        }
        let year: usize = record[0].parse().map_err(|_| CoreError::CsvParse {
            path: path_str.clone(),
            detail: format!("year is not a valid integer: {:?}", &record[0]),
        })?;
        if year == 0 || year > LAPSE_TABLE_LEN {
            return Err(CoreError::CsvParse {
                path: path_str.clone(),
                detail: format!("year {year} out of range 1..={LAPSE_TABLE_LEN}"),
            });
        }
        data[year - 1] = parse_f64(&path_str, "lapse_rate", &record[1])?;
    }

    LapseTable::from_flat(data)
}

/// Loads expense assumptions from a two-column `name,value` file naming the
/// four expense fields: `acquisition`, `maintenance`, `pct_premium`,
/// `per_claim`.
pub fn load_expense_assumptions(
    path: impl AsRef<Path>,
) -> Result<ExpenseAssumptions, CoreError> {
    let path_str = path.as_ref().display().to_string();
    let mut reader = open(&path)?;
    let mut acquisition = None;
    let mut maintenance = None;
    let mut pct_premium = None;
    let mut per_claim = None;

    for record in reader.records() {
        let record = record.map_err(|e| CoreError::CsvParse {
            path: path_str.clone(),
            detail: e.to_string(),
        })?;
        if record.len() < 2 {
            return Err(CoreError::CsvParse {
                path: path_str.clone(),
                detail: format!("expected 2 columns, got {}", record.len()),
            });
        }
        let value = parse_f64(&path_str, &record[0], &record[1])?;
        match record[0].trim() {
            "acquisition" => acquisition = Some(value),
            "maintenance" => maintenance = Some(value),
            "pct_premium" => pct_premium = Some(value),
            "per_claim" => per_claim = Some(value),
            other => {
                return Err(CoreError::CsvParse {
                    path: path_str.clone(),
                    detail: format!("unrecognized expense field {other:?}"),
                })
            }
        }
    }

    let flat = [
        acquisition.ok_or_else(|| CoreError::MissingField("acquisition".into()))?,
        maintenance.ok_or_else(|| CoreError::MissingField("maintenance".into()))?,
        pct_premium.ok_or_else(|| CoreError::MissingField("pct_premium".into()))?,
        per_claim.ok_or_else(|| CoreError::MissingField("per_claim".into()))?,
    ];
    debug_assert_eq!(flat.len(), EXPENSE_TABLE_LEN);
    ExpenseAssumptions::from_flat(&flat)
}

/// Loads a policy portfolio from a CSV with header
/// `policy_id,age,gender,sum_assured,premium,term,product_type`.
/// Underwriting class has no column in this minimal schema and defaults
/// to `Standard` for every row.
pub fn load_policies(path: impl AsRef<Path>) -> Result<PolicySet, CoreError> {
    let path_str = path.as_ref().display().to_string();
    let mut reader = open(&path)?;
    let mut policies = PolicySet::new();

    for record in reader.records() {
        let record = record.map_err(|e| CoreError::CsvParse {
            path: path_str.clone(),
            detail: e.to_string(),
        })?;
        if record.len() < 7 {
            return Err(CoreError::CsvParse {
                path: path_str.clone(),
                detail: format!("expected 7 columns, got {}", record.len()),
            });
        }

        let policy_id: u64 = record[0].parse().map_err(|_| CoreError::CsvParse {
            path: path_str.clone(),
            detail: format!("policy_id is not a valid integer: {:?}", &record[0]),
        })?;
        let age: u8 = record[1].parse().map_err(|_| CoreError::CsvParse {
            path: path_str.clone(),
            detail: format!("age is not a valid integer: {:?}", &record[1]),
        })?;
        let gender = Gender::from_str_loose(&record[2])?;
        let sum_assured = parse_f64(&path_str, "sum_assured", &record[3])?;
        let premium = parse_f64(&path_str, "premium", &record[4])?;
        let term: u8 = record[5].parse().map_err(|_| CoreError::CsvParse {
            path: path_str.clone(),
            detail: format!("term is not a valid integer: {:?}", &record[5]),
        })?;
        let product_type = ProductType::from_str_loose(&record[6]);

        let policy = Policy::new(
            policy_id,
            age,
            gender,
            sum_assured,
            premium,
            term,
            product_type,
            crate::types::UnderwritingClass::Standard,
        )?;
        policies.add(policy);
    }

    Ok(policies)
}
