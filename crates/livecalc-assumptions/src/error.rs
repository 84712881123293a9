use thiserror::Error;

/// A single composite error kind wrapping transport/auth/decode failures
/// with `(name, version)` context.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to resolve '{name}:{version}': {source}")]
    Transport {
        name: String,
        version: String,
        #[source]
        source: livecalc_transport::TransportError,
    },

    #[error("failed to resolve '{name}:{version}': authentication failed: {source}")]
    Auth {
        name: String,
        version: String,
        #[source]
        source: livecalc_auth::AuthError,
    },

    #[error("failed to resolve '{name}:{version}': {detail}")]
    Decode {
        name: String,
        version: String,
        detail: String,
    },

    #[error("missing required attribute '{attribute}' when resolving '{name}:{version}'")]
    MissingAttribute {
        name: String,
        version: String,
        attribute: &'static str,
    },

    #[error("attribute '{attribute}' out of range when resolving '{name}:{version}': {detail}")]
    AttributeOutOfRange {
        name: String,
        version: String,
        attribute: &'static str,
        detail: String,
    },

    #[error("failed to load local file '{path}': {source}")]
    LocalFile {
        path: String,
        #[source]
        source: livecalc_core::CoreError,
    },
}
