use thiserror::Error;

/// Errors raised by the blocking HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    // ── Transport-level failures ─────────────────────────────────────────────
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    // ── HTTP status failures (after retry policy has run its course) ────────
    #[error("{message}")]
    HttpStatus { status: u16, message: String },
}

impl TransportError {
    /// Whether this status is one the transport's retry policy would act on:
    /// 408, 429, or any 5xx. 401/403/404 and other 4xx fail fast.
    pub fn is_retryable_status(status: u16) -> bool {
        status == 408 || status == 429 || (500..600).contains(&status)
    }

    /// Status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
