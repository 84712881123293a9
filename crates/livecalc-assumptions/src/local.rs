use std::path::Path;

use livecalc_core::csv_io;

use crate::error::ResolutionError;
use crate::resolver::AssumptionResolver;

/// Loads a mortality table from a local CSV, bypassing the transport,
/// token handler, and cache entirely, and records `local:<path>` as the
/// resolution source for `name`.
pub fn load_local_mortality(
    resolver: &AssumptionResolver,
    name: &str,
    path: impl AsRef<Path>,
) -> Result<Vec<f64>, ResolutionError> {
    let path_str = path.as_ref().display().to_string();
    let table = csv_io::load_mortality_table(&path).map_err(|e| ResolutionError::LocalFile {
        path: path_str.clone(),
        source: e,
    })?;
    resolver.record_local_source(name, &path_str);
    Ok(table.as_flat().to_vec())
}

/// Loads a lapse table from a local CSV, bypassing the transport, token
/// handler, and cache entirely.
pub fn load_local_lapse(
    resolver: &AssumptionResolver,
    name: &str,
    path: impl AsRef<Path>,
) -> Result<Vec<f64>, ResolutionError> {
    let path_str = path.as_ref().display().to_string();
    let table = csv_io::load_lapse_table(&path).map_err(|e| ResolutionError::LocalFile {
        path: path_str.clone(),
        source: e,
    })?;
    resolver.record_local_source(name, &path_str);
    Ok(table.as_flat().to_vec())
}

/// Loads expense assumptions from a local name/value CSV.
pub fn load_local_expense(
    resolver: &AssumptionResolver,
    name: &str,
    path: impl AsRef<Path>,
) -> Result<Vec<f64>, ResolutionError> {
    let path_str = path.as_ref().display().to_string();
    let expense = csv_io::load_expense_assumptions(&path).map_err(|e| ResolutionError::LocalFile {
        path: path_str.clone(),
        source: e,
    })?;
    resolver.record_local_source(name, &path_str);
    Ok(expense.as_flat().to_vec())
}
