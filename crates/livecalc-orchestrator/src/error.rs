use thiserror::Error;

/// Errors raised by the orchestrator: engine lifecycle violations, buffer
/// decode failures, and credential discovery.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    // ── Engine lifecycle ─────────────────────────────────────────────────────
    #[error("engine operation '{operation}' is invalid in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: crate::engine::EngineState,
    },

    #[error("engine initialization failed: {0}")]
    InitializationFailed(String),

    #[error("engine run failed: {0}")]
    RunFailed(String),

    // ── Buffer decoding ──────────────────────────────────────────────────────
    #[error("input buffer length {got} is not a multiple of the {expected}-byte record stride")]
    MisalignedBuffer { expected: usize, got: usize },

    #[error("invalid enum byte {value} for field {field} in policy record {index}")]
    InvalidRecordField {
        field: &'static str,
        value: u8,
        index: usize,
    },

    // ── Credential discovery ─────────────────────────────────────────────────
    #[error("no Assumptions Manager URL found: supply one explicitly, set LIVECALC_AM_URL, or write ~/.livecalc/credentials.json")]
    MissingAmUrl,

    #[error("failed to read credentials file {path}: {detail}")]
    CredentialsFile { path: String, detail: String },

    #[error(transparent)]
    Resolution(#[from] livecalc_assumptions::ResolutionError),
}
