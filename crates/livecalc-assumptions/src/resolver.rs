use std::collections::HashMap;
use std::sync::Mutex;

use livecalc_auth::TokenHandler;
use livecalc_cache::TableCache;
use livecalc_transport::HttpTransport;

use crate::attrs::AttrValue;
use crate::error::ResolutionError;

/// Coordinates the transport, token handler, and table cache to turn a
/// `(name, version)` pair into a flat vector of doubles, and exposes
/// attribute-keyed scalar lookups on top of it.
///
/// Note on lock discipline: the cache's own mutex is acquired and released
/// entirely within `TableCache::get`/`put`; this resolver never holds it
/// across the HTTP round-trip, so the token mutex and the cache mutex are
/// never nested.
pub struct AssumptionResolver {
    transport: HttpTransport,
    token_handler: TokenHandler,
    cache: TableCache,
    resolved_versions: Mutex<HashMap<String, String>>,
}

impl AssumptionResolver {
    pub fn new(transport: HttpTransport, token_handler: TokenHandler, cache: TableCache) -> Self {
        Self {
            transport,
            token_handler,
            cache,
            resolved_versions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the flat table for `name`/`version`. Consults the cache on
    /// cacheable keys; on miss or non-cacheable keys, fetches from the
    /// Assumptions Manager and, if cacheable, stores the result.
    pub fn resolve(&self, name: &str, version: &str) -> Result<Vec<f64>, ResolutionError> {
        let key = format!("{name}:{version}");

        if TableCache::is_cacheable(&key) {
            if let Some(data) = self.cache.get(&key) {
                self.record_source(name, &key);
                return Ok(data);
            }
        }

        let data = self.fetch_from_api(name, version)?;

        if TableCache::is_cacheable(&key) {
            self.cache.put(&key, version, data.clone());
        }
        self.record_source(name, &key);
        Ok(data)
    }

    /// Resolves the full table, then indexes it by the attribute bag using
    /// the mortality-table scalar lookup protocol.
    pub fn resolve_scalar(
        &self,
        name: &str,
        version: &str,
        attrs: &HashMap<String, AttrValue>,
    ) -> Result<f64, ResolutionError> {
        let table = self.resolve(name, version)?;

        let age = attrs
            .get("age")
            .and_then(AttrValue::as_i64)
            .ok_or_else(|| ResolutionError::MissingAttribute {
                name: name.to_string(),
                version: version.to_string(),
                attribute: "age",
            })?;

        if !(0..=120).contains(&age) {
            return Err(ResolutionError::AttributeOutOfRange {
                name: name.to_string(),
                version: version.to_string(),
                attribute: "age",
                detail: format!("{age} is outside [0, 120]"),
            });
        }

        let mut index = age as usize;
        if let Some(gender) = attrs.get("gender").and_then(AttrValue::as_str) {
            if matches!(gender, "F" | "Female" | "2") {
                index += 121;
            }
        }

        table
            .get(index)
            .copied()
            .ok_or_else(|| ResolutionError::AttributeOutOfRange {
                name: name.to_string(),
                version: version.to_string(),
                attribute: "age/gender",
                detail: format!("index {index} out of bounds for table of length {}", table.len()),
            })
    }

    /// Issues `GET /api/v1/tables/{name}/versions` and flattens the
    /// response array, accepting either raw strings or objects carrying a
    /// `version` field.
    pub fn list_versions(&self, name: &str) -> Result<Vec<String>, ResolutionError> {
        let token = self.current_token(name, "*")?;
        let path = format!("/api/v1/tables/{name}/versions");
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));

        let response = self
            .transport
            .get(&path, &headers)
            .map_err(|e| ResolutionError::Transport {
                name: name.to_string(),
                version: "*".to_string(),
                source: e,
            })?;

        let parsed: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|e| ResolutionError::Decode {
                name: name.to_string(),
                version: "*".to_string(),
                detail: e.to_string(),
            })?;

        let array = parsed
            .get("versions")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ResolutionError::Decode {
                name: name.to_string(),
                version: "*".to_string(),
                detail: "response missing 'versions' array".to_string(),
            })?;

        let mut versions = Vec::with_capacity(array.len());
        for item in array {
            if let Some(s) = item.as_str() {
                versions.push(s.to_string());
            } else if let Some(s) = item.get("version").and_then(|v| v.as_str()) {
                versions.push(s.to_string());
            }
        }
        Ok(versions)
    }

    /// Audit map of table name to the source the last resolution used:
    /// `name:version` for remote resolutions or `local:<path>` for local
    /// CSV fallback loads.
    pub fn resolved_versions(&self) -> HashMap<String, String> {
        self.resolved_versions
            .lock()
            .expect("resolved_versions mutex poisoned")
            .clone()
    }

    pub fn cache_stats(&self) -> livecalc_cache::CacheStats {
        self.cache.stats()
    }

    fn fetch_from_api(&self, name: &str, version: &str) -> Result<Vec<f64>, ResolutionError> {
        let token = self.current_token(name, version)?;
        let path = format!("/api/v1/tables/{name}/versions/{version}/data");
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));

        let response = self
            .transport
            .get(&path, &headers)
            .map_err(|e| ResolutionError::Transport {
                name: name.to_string(),
                version: version.to_string(),
                source: e,
            })?;

        let parsed: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|e| ResolutionError::Decode {
                name: name.to_string(),
                version: version.to_string(),
                detail: e.to_string(),
            })?;

        let data_value = parsed.get("data").ok_or_else(|| ResolutionError::Decode {
            name: name.to_string(),
            version: version.to_string(),
            detail: "response missing 'data' field".to_string(),
        })?;

        flatten_numeric(data_value).ok_or_else(|| ResolutionError::Decode {
            name: name.to_string(),
            version: version.to_string(),
            detail: "'data' contains non-numeric values".to_string(),
        })
    }

    fn current_token(&self, name: &str, version: &str) -> Result<String, ResolutionError> {
        self.token_handler
            .current_token()
            .map_err(|e| ResolutionError::Auth {
                name: name.to_string(),
                version: version.to_string(),
                source: e,
            })
    }

    fn record_source(&self, name: &str, source: &str) {
        self.resolved_versions
            .lock()
            .expect("resolved_versions mutex poisoned")
            .insert(name.to_string(), source.to_string());
    }

    /// Records a local-file resolution for audit purposes; called by the
    /// free functions in [`crate::local`] after a successful load.
    pub(crate) fn record_local_source(&self, name: &str, path: &str) {
        self.record_source(name, &format!("local:{path}"));
    }
}

/// Flattens a JSON value into a `Vec<f64>`: a flat array, or a ragged 2-D
/// array flattened row-major.
fn flatten_numeric(value: &serde_json::Value) -> Option<Vec<f64>> {
    let array = value.as_array()?;
    let mut out = Vec::with_capacity(array.len());
    for item in array {
        if let Some(n) = item.as_f64() {
            out.push(n);
        } else if let Some(inner) = item.as_array() {
            for inner_item in inner {
                out.push(inner_item.as_f64()?);
            }
        } else {
            return None;
        }
    }
    Some(out)
}
