//! Credential-source discovery for the Assumptions Manager connection.
//! Precedence, highest first: explicit constructor arguments,
//! `LIVECALC_AM_URL`/`LIVECALC_AM_TOKEN`/`LIVECALC_AM_CACHE_DIR`
//! environment variables, then `~/.livecalc/credentials.json`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::OrchestratorError;

/// Resolved connection details for the Assumptions Manager.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub am_url: Option<String>,
    pub am_token: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
struct CredentialsFile {
    am_url: Option<String>,
    am_token: Option<String>,
    cache_dir: Option<String>,
}

/// Discovers credentials by merging the three sources in priority order:
/// any field already set on `explicit` wins outright; otherwise the
/// corresponding environment variable is consulted; otherwise the
/// credentials file fills in what's left. Fields left unset by all three
/// sources stay `None`.
pub fn discover(explicit: Credentials) -> Result<Credentials, OrchestratorError> {
    let mut resolved = explicit;

    if resolved.am_url.is_none() {
        resolved.am_url = std::env::var("LIVECALC_AM_URL").ok();
    }
    if resolved.am_token.is_none() {
        resolved.am_token = std::env::var("LIVECALC_AM_TOKEN").ok();
    }
    if resolved.cache_dir.is_none() {
        resolved.cache_dir = std::env::var_os("LIVECALC_AM_CACHE_DIR").map(PathBuf::from);
    }

    if resolved.am_url.is_none() || resolved.am_token.is_none() || resolved.cache_dir.is_none() {
        if let Some(from_file) = read_credentials_file()? {
            resolved.am_url = resolved.am_url.or(from_file.am_url);
            resolved.am_token = resolved.am_token.or(from_file.am_token);
            resolved.cache_dir = resolved.cache_dir.or(from_file.cache_dir);
        }
    }

    Ok(resolved)
}

/// Resolves `~/.livecalc/credentials.json`, returning `Ok(None)` if
/// `HOME`/`USERPROFILE` can't be determined or the file doesn't exist —
/// a missing credentials file is not an error, just an exhausted source.
fn read_credentials_file() -> Result<Option<Credentials>, OrchestratorError> {
    let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) else {
        return Ok(None);
    };
    let path = PathBuf::from(home).join(".livecalc").join("credentials.json");
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| OrchestratorError::CredentialsFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let parsed: CredentialsFile =
        serde_json::from_str(&contents).map_err(|e| OrchestratorError::CredentialsFile {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;

    Ok(Some(Credentials {
        am_url: parsed.am_url,
        am_token: parsed.am_token,
        cache_dir: parsed.cache_dir.map(PathBuf::from),
    }))
}
