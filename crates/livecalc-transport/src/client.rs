use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use livecalc_core::constants::{
    DEFAULT_TRANSPORT_TIMEOUT_SECS, MAX_TRANSPORT_ATTEMPTS, TRANSPORT_RETRY_DELAYS_MS,
};

use crate::error::TransportError;

/// Response returned by [`HttpTransport::get`] / [`HttpTransport::post`].
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub response_headers: HashMap<String, String>,
    pub wall_duration: Duration,
}

/// Blocking HTTP client with fixed-backoff retries, status-specific error
/// synthesis, and header redaction in debug logs.
///
/// One instance per thread is the supported usage pattern; `reqwest`'s
/// blocking client is internally `Send + Sync` so sharing is possible but
/// not required.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TRANSPORT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Transport(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    pub fn get(
        &self,
        path: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, TransportError> {
        self.execute_with_retry("GET", path, None, headers)
    }

    pub fn post(
        &self,
        path: &str,
        body: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, TransportError> {
        self.execute_with_retry("POST", path, Some(body), headers)
    }

    fn execute_with_retry(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_err: Option<TransportError> = None;

        for attempt in 0..MAX_TRANSPORT_ATTEMPTS {
            for (key, value) in headers {
                if key.eq_ignore_ascii_case("authorization") {
                    tracing::debug!(header = %key, value = "[REDACTED]", "request header");
                } else {
                    tracing::debug!(header = %key, %value, "request header");
                }
            }
            tracing::debug!(%method, %url, "sending request");

            let start = Instant::now();
            let result = self.send_once(method, &url, body, headers);
            let elapsed = start.elapsed();

            match result {
                Ok(response) => {
                    tracing::debug!(status = response.status_code, elapsed_ms = elapsed.as_millis() as u64, "response received");

                    if response.status_code >= 400 {
                        if TransportError::is_retryable_status(response.status_code)
                            && attempt + 1 < MAX_TRANSPORT_ATTEMPTS
                        {
                            last_err = Some(TransportError::HttpStatus {
                                status: response.status_code,
                                message: format!(
                                    "HTTP {}: {}",
                                    response.status_code, response.body
                                ),
                            });
                            sleep_before_retry(attempt);
                            continue;
                        }
                        return Err(TransportError::HttpStatus {
                            status: response.status_code,
                            message: status_message(response.status_code, &response.body),
                        });
                    }

                    return Ok(response);
                }
                Err(e) => {
                    last_err = Some(TransportError::Transport(e.to_string()));
                    if attempt + 1 < MAX_TRANSPORT_ATTEMPTS {
                        sleep_before_retry(attempt);
                        continue;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| TransportError::Transport("unknown transport error".into())))
    }

    fn send_once(
        &self,
        method: &str,
        url: &str,
        body: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> reqwest::Result<HttpResponse> {
        let mut builder = match method {
            "POST" => self.client.post(url),
            _ => self.client.get(url),
        };

        builder = builder.header("Content-Type", "application/json");
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        let start = Instant::now();
        let response = builder.send()?;
        let status_code = response.status().as_u16();

        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(name.to_string(), v.to_string());
            }
        }

        let response_body = response.text()?;
        let wall_duration = start.elapsed();

        Ok(HttpResponse {
            status_code,
            body: response_body,
            response_headers,
            wall_duration,
        })
    }
}

fn sleep_before_retry(attempt: u32) {
    let idx = attempt as usize;
    if let Some(delay_ms) = TRANSPORT_RETRY_DELAYS_MS.get(idx) {
        tracing::debug!(delay_ms = *delay_ms, "retrying after backoff");
        thread::sleep(Duration::from_millis(*delay_ms));
    }
}

/// Status-specific message synthesis.
fn status_message(status: u16, body: &str) -> String {
    match status {
        401 => "authentication failed".to_string(),
        403 => "access denied".to_string(),
        404 => "resource not found".to_string(),
        500..=599 => "server error".to_string(),
        _ => format!("HTTP {status}: {body}"),
    }
}
