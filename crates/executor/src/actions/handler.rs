//! Request processing: look up, perform, merge, write, retry on conflict.

use std::time::Duration;

use datastore_core::{merge_write_request_elements, Fqid, WriteRequestElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::ActionRegistry;
use crate::convert::convert_result;
use crate::{Datastore, Error, Result};

// ============================================================================
// Retry Configuration
// ============================================================================

/// Configuration for conflict retry behavior
///
/// A request whose write conflicts is prepared again from fresh reads and
/// resubmitted, waiting with exponential backoff between attempts.
///
/// # Example
///
/// ```
/// use datastore_executor::RetryConfig;
///
/// let config = RetryConfig::new().with_max_retries(5).with_max_delay_ms(200);
/// assert_eq!(config.max_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set base delay in milliseconds
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay in milliseconds
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Delay before retry number `attempt + 1` (exponential backoff)
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        // 1 << 63 is the largest u64 power of two
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

// ============================================================================
// Requests and results
// ============================================================================

/// One action invocation: the action name and its payload instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionRequest {
    /// Registered action name, e.g. `topic.create`
    pub action: String,
    /// Payload instances
    #[serde(default)]
    pub data: Vec<Value>,
}

impl ActionRequest {
    /// Create a request
    pub fn new(action: impl Into<String>, data: Vec<Value>) -> Self {
        ActionRequest {
            action: action.into(),
            data,
        }
    }
}

/// Outcome of one [`ActionRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Action that ran
    pub action: String,
    /// Entities its events touched, in event order
    pub fqids: Vec<Fqid>,
}

impl ActionResult {
    fn from_elements(action: &str, elements: &[WriteRequestElement]) -> Self {
        let mut fqids: Vec<Fqid> = Vec::new();
        for event in elements.iter().flat_map(|element| element.events()) {
            if !fqids.contains(event.fqid()) {
                fqids.push(event.fqid().clone());
            }
        }
        ActionResult {
            action: action.to_string(),
            fqids,
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Runs batches of action requests against a datastore.
///
/// All elements produced by one `handle` call are merged and written once,
/// so either every action of the batch takes effect or none does.
pub struct ActionHandler<'a> {
    registry: &'a ActionRegistry,
    datastore: &'a dyn Datastore,
    retry: RetryConfig,
}

impl<'a> ActionHandler<'a> {
    /// Create a handler with the default retry configuration
    pub fn new(registry: &'a ActionRegistry, datastore: &'a dyn Datastore) -> Self {
        ActionHandler {
            registry,
            datastore,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry configuration
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Process `requests` on behalf of `user_id`
    ///
    /// # Errors
    ///
    /// - `Error::UnknownAction` if a request names an unregistered action
    /// - `Error::Conflict` if the write still conflicts after every retry
    /// - any error an action or the datastore reports, unchanged
    pub fn handle(&self, requests: &[ActionRequest], user_id: u64) -> Result<Vec<ActionResult>> {
        let mut last_error = None;

        for attempt in 0..=self.retry.max_retries {
            let (results, elements) = self.prepare(requests, user_id)?;
            if elements.is_empty() {
                return Ok(results);
            }
            let element = convert_result(merge_write_request_elements(elements))?;

            match self.datastore.write(element) {
                Ok(()) => {
                    debug!(
                        target: "datastore::actions",
                        requests = requests.len(),
                        user_id,
                        attempt,
                        "Action request written"
                    );
                    return Ok(results);
                }
                Err(e) if e.is_conflict() && attempt < self.retry.max_retries => {
                    warn!(
                        target: "datastore::actions",
                        attempt,
                        error = %e,
                        "Write conflicted, preparing the request again"
                    );
                    last_error = Some(e);
                    std::thread::sleep(self.retry.calculate_delay(attempt));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Internal {
            reason: "retry loop exited without returning a result".into(),
        }))
    }

    fn prepare(
        &self,
        requests: &[ActionRequest],
        user_id: u64,
    ) -> Result<(Vec<ActionResult>, Vec<WriteRequestElement>)> {
        let mut results = Vec::with_capacity(requests.len());
        let mut all_elements = Vec::new();
        for request in requests {
            let action = self
                .registry
                .get(&request.action)
                .ok_or_else(|| Error::UnknownAction {
                    action: request.action.clone(),
                })?;
            let elements = action.perform(self.datastore, &request.data, user_id)?;
            results.push(ActionResult::from_elements(&request.action, &elements));
            all_elements.extend(elements);
        }
        Ok((results, all_elements))
    }
}
