use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use livecalc_core::constants::TOKEN_REFRESH_THRESHOLD_SECONDS;
use livecalc_transport::HttpTransport;

use crate::error::AuthError;

/// A decoded bearer token: the raw wire value plus its parsed expiry.
/// `Debug` is implemented by hand so the raw token never appears in log
/// output.
#[derive(Clone)]
pub struct Token {
    raw: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Parses `raw` as a three-segment JWT and decodes its `exp` claim.
    /// Fails loudly rather than assuming a default lifetime.
    pub fn parse(raw: impl Into<String>) -> Result<Self, AuthError> {
        let raw = raw.into();
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(AuthError::MalformedToken {
                segments: segments.len(),
            });
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(segments[1])
            .map_err(|e| AuthError::InvalidBase64 {
                detail: e.to_string(),
            })?;

        let payload: serde_json::Value =
            serde_json::from_slice(&payload_bytes).map_err(|e| AuthError::InvalidPayloadJson {
                detail: e.to_string(),
            })?;

        let exp = payload
            .get("exp")
            .and_then(|v| v.as_i64())
            .ok_or(AuthError::MissingExpiryClaim)?;

        let expires_at =
            DateTime::from_timestamp(exp, 0).ok_or(AuthError::MissingExpiryClaim)?;

        Ok(Self { raw, expires_at })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("raw", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

struct Credentials {
    username: String,
    password: String,
}

struct State {
    token: Token,
    credentials: Option<Credentials>,
}

/// Owns a bearer token, refreshing it before expiry and serializing access
/// across threads.
pub struct TokenHandler {
    am_url: String,
    transport: HttpTransport,
    state: Mutex<State>,
}

impl TokenHandler {
    /// Eager constructor: performs a login POST immediately.
    pub fn with_credentials(
        am_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let am_url = am_url.into();
        let transport = HttpTransport::new(am_url.clone()).map_err(AuthError::LoginFailed)?;
        let credentials = Credentials {
            username: username.into(),
            password: password.into(),
        };
        let token = login(&transport, &credentials)?;
        Ok(Self {
            am_url,
            transport,
            state: Mutex::new(State {
                token,
                credentials: Some(credentials),
            }),
        })
    }

    /// Lazy constructor: wraps an already-issued token, no refresh
    /// credentials available.
    pub fn with_token(am_url: impl Into<String>, existing_token: impl Into<String>) -> Result<Self, AuthError> {
        let am_url = am_url.into();
        let transport = HttpTransport::new(am_url.clone()).map_err(AuthError::LoginFailed)?;
        let token = Token::parse(existing_token)?;
        Ok(Self {
            am_url,
            transport,
            state: Mutex::new(State {
                token,
                credentials: None,
            }),
        })
    }

    /// Returns the cached token, refreshing it first if fewer than
    /// `TOKEN_REFRESH_THRESHOLD_SECONDS` remain until expiry.
    pub fn current_token(&self) -> Result<String, AuthError> {
        let mut guard = self.state.lock().expect("token mutex poisoned");
        if guard.token.seconds_until_expiry() < TOKEN_REFRESH_THRESHOLD_SECONDS {
            refresh_locked(&self.transport, &mut guard)?;
        }
        Ok(guard.token.as_str().to_string())
    }

    pub fn seconds_until_expiry(&self) -> i64 {
        let guard = self.state.lock().expect("token mutex poisoned");
        guard.token.seconds_until_expiry()
    }

    /// Unconditional refresh. Fails if no credentials were supplied.
    pub fn force_refresh(&self) -> Result<(), AuthError> {
        let mut guard = self.state.lock().expect("token mutex poisoned");
        refresh_locked(&self.transport, &mut guard)
    }

    pub fn am_url(&self) -> &str {
        &self.am_url
    }
}

fn refresh_locked(transport: &HttpTransport, state: &mut State) -> Result<(), AuthError> {
    let credentials = state.credentials.as_ref().ok_or(AuthError::NoCredentials)?;
    state.token = login(transport, credentials)?;
    Ok(())
}

fn login(transport: &HttpTransport, credentials: &Credentials) -> Result<Token, AuthError> {
    let body = serde_json::json!({
        "username": credentials.username,
        "password": credentials.password,
    })
    .to_string();

    let response = transport
        .post("/api/v1/auth/login", &body, &Default::default())
        .map_err(AuthError::LoginFailed)?;

    let parsed: serde_json::Value =
        serde_json::from_str(&response.body).map_err(|e| AuthError::InvalidLoginResponse {
            detail: e.to_string(),
        })?;

    let raw_token = parsed
        .get("token")
        .and_then(|v| v.as_str())
        .ok_or(AuthError::MissingTokenField)?;

    Token::parse(raw_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn make_jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"none\"}");
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn parses_exp_claim_from_payload() {
        let exp = Utc::now().timestamp() + 3600;
        let token = Token::parse(make_jwt(exp)).unwrap();
        assert!(token.seconds_until_expiry() > 3500);
    }

    #[test]
    fn rejects_malformed_token_without_echoing_it() {
        let bogus = "not-a-real-jwt-at-all";
        let err = Token::parse(bogus).unwrap_err();
        let message = err.to_string();
        assert!(!message.contains(bogus));
    }

    #[test]
    fn rejects_non_json_payload() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let token_str = format!("{header}.{payload}.sig");
        let err = Token::parse(token_str).unwrap_err();
        assert!(matches!(err, AuthError::InvalidPayloadJson { .. }));
    }

    #[test]
    fn rejects_payload_missing_exp() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = URL_SAFE_NO_PAD.encode(b"{\"sub\":\"x\"}");
        let token_str = format!("{header}.{payload}.sig");
        let err = Token::parse(token_str).unwrap_err();
        assert!(matches!(err, AuthError::MissingExpiryClaim));
    }

    #[test]
    fn debug_never_prints_raw_token() {
        let exp = Utc::now().timestamp() + 3600;
        let token = Token::parse(make_jwt(exp)).unwrap();
        let debug_str = format!("{token:?}");
        assert!(!debug_str.contains(token.as_str()));
    }
}
