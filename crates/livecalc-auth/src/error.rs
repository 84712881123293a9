use thiserror::Error;

/// Errors raised while fetching, decoding, or refreshing a bearer token.
/// No variant ever carries the raw token string — only structural detail
/// about why decoding or refresh failed.
#[derive(Debug, Error)]
pub enum AuthError {
    // ── Token format ──────────────────────────────────────────────────────────
    #[error("malformed JWT: expected three dot-separated segments, found {segments}")]
    MalformedToken { segments: usize },

    #[error("JWT payload segment is not valid base64url: {detail}")]
    InvalidBase64 { detail: String },

    #[error("JWT payload is not valid JSON: {detail}")]
    InvalidPayloadJson { detail: String },

    #[error("JWT payload is missing required claim `exp`")]
    MissingExpiryClaim,

    // ── Refresh ──────────────────────────────────────────────────────────────
    #[error("token requires refresh but no credentials were supplied")]
    NoCredentials,

    #[error("login request failed: {0}")]
    LoginFailed(#[source] livecalc_transport::TransportError),

    #[error("login response is not valid JSON: {detail}")]
    InvalidLoginResponse { detail: String },

    #[error("login response is missing the `token` field")]
    MissingTokenField,
}
