//! Shared HTTP client for the reader and writer services
//!
//! One POST per call with a JSON body. No retries: a failed call surfaces
//! to the caller, who decides whether to try again.

use datastore_core::{Error, FqField, Result};
use serde_json::Value;
use std::time::Duration;

/// Message used for every server-side or connection failure
pub const UNAVAILABLE_MESSAGE: &str = "Connection to datastore failed.";

/// `type_verbose` of the error the datastore reports for a lock violation
pub const MODEL_LOCKED: &str = "MODEL_LOCKED";

// ============================================================================
// Response Classification
// ============================================================================

/// Classify a datastore response into a payload or a failure
///
/// - status >= 500 → `Unavailable`
/// - body carrying `error` → `Conflict` for a model-locked error,
///   otherwise `Rejected` with the server message verbatim
/// - any other non-2xx status → `Rejected`
/// - otherwise the parsed body (`null` for an empty body)
pub fn classify_response(status: u16, body: &str) -> Result<Value> {
    if status >= 500 {
        return Err(Error::Unavailable(format!(
            "{} (status {})",
            UNAVAILABLE_MESSAGE, status
        )));
    }

    let success = (200..300).contains(&status);
    let parsed = if body.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(e) if success => {
                return Err(Error::Serialization(format!(
                    "invalid JSON response from datastore: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(Error::Rejected {
                    status: Some(status),
                    message: body.to_string(),
                })
            }
        }
    };

    if let Some(error) = parsed.get("error").filter(|e| !e.is_null()) {
        return Err(error_from_body(status, error));
    }

    if !success {
        return Err(Error::Rejected {
            status: Some(status),
            message: if parsed.is_null() {
                format!("datastore answered with status {}", status)
            } else {
                parsed.to_string()
            },
        });
    }

    Ok(parsed)
}

fn error_from_body(status: u16, error: &Value) -> Error {
    let message = match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("msg")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    };

    if error.get("type_verbose").and_then(Value::as_str) == Some(MODEL_LOCKED) {
        return Error::Conflict {
            fqfields: locked_keys(error),
            message,
        };
    }

    Error::Rejected {
        status: Some(status),
        message,
    }
}

/// Offending fields of a model-locked error (`key` or `keys`)
///
/// Keys that are not FQFields (e.g. a bare FQID) are skipped.
fn locked_keys(error: &Value) -> Vec<FqField> {
    let mut keys: Vec<&str> = Vec::new();
    if let Some(key) = error.get("key").and_then(Value::as_str) {
        keys.push(key);
    }
    if let Some(list) = error.get("keys").and_then(Value::as_array) {
        keys.extend(list.iter().filter_map(Value::as_str));
    }
    keys.into_iter().filter_map(|k| k.parse().ok()).collect()
}

// ============================================================================
// Client
// ============================================================================

/// Blocking JSON-over-HTTP client bound to one service base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        HttpClient {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into(),
        }
    }

    /// The service base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an endpoint
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// POST `payload` to `endpoint` and classify the answer
    pub fn post(&self, endpoint: &str, payload: &Value) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        let body_bytes = serde_json::to_vec(payload)?;

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&body_bytes[..])
            .map_err(|e| {
                tracing::warn!(
                    target: "datastore::http",
                    endpoint,
                    error = %e,
                    "Request to datastore failed"
                );
                Error::Unavailable(format!("{} ({})", UNAVAILABLE_MESSAGE, e))
            })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Unavailable(format!("failed to read response: {}", e)))?;

        tracing::debug!(target: "datastore::http", endpoint, status, "Datastore responded");

        classify_response(status, &body).map_err(|e| {
            match &e {
                Error::Conflict { fqfields, .. } => tracing::warn!(
                    target: "datastore::http",
                    endpoint,
                    conflicts = fqfields.len(),
                    "Write rejected by lock check"
                ),
                Error::Unavailable(_) => tracing::warn!(
                    target: "datastore::http",
                    endpoint,
                    status,
                    "Datastore unavailable"
                ),
                _ => {}
            }
            e
        })
    }
}
