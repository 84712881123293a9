use thiserror::Error;

/// Errors raised while constructing or validating the shared data model
/// (policies, assumption tables, scenarios) or loading them from local files.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid value for field {field}: {value}")]
    InvalidEnumValue { field: &'static str, value: u32 },

    #[error("invalid attribute {attribute}: {detail}")]
    InvalidAttribute {
        attribute: &'static str,
        detail: String,
    },

    #[error("mortality table must have exactly {expected} entries, got {got}")]
    MortalityTableWrongLength { expected: usize, got: usize },

    #[error("lapse table must have exactly {expected} entries, got {got}")]
    LapseTableWrongLength { expected: usize, got: usize },

    #[error("expense table must have exactly {expected} entries, got {got}")]
    ExpenseTableWrongLength { expected: usize, got: usize },

    #[error("scenario year {year} is out of range 1..=50")]
    ScenarioYearOutOfRange { year: u8 },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV row in {path}: {detail}")]
    CsvParse { path: String, detail: String },

    #[error("missing required field {0} in local assumption file")]
    MissingField(String),
}
