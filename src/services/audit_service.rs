//! Audit emitter - best-effort delivery of mutation records to an
//! external audit-log sink.
//!
//! Every shipment mutation produces a record that is POSTed to the sink.
//! Delivery is fire-and-forget: the triggering operation only pays for
//! spawning the task. Missing credentials, network failures, timeouts and
//! non-2xx responses are logged locally and swallowed; none of them can
//! fail or delay the mutation.

use crate::models::audit::AuditRecord;
use std::time::Duration;

/// Upper bound on a single delivery attempt. A slow sink must not be able
/// to pile up hung tasks.
const SINK_TIMEOUT: Duration = Duration::from_secs(3);

/// Handle to the external audit-log sink.
///
/// Cheap to clone (the inner `reqwest::Client` is shared); one instance
/// is built at startup and carried in the application state.
#[derive(Debug, Clone)]
pub struct AuditEmitter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AuditEmitter {
    /// Build an emitter for the sink at `base_url`.
    ///
    /// `api_key` is the bearer credential; when `None`, every emission is
    /// skipped with a warning instead of being sent unauthenticated.
    pub fn new(base_url: &str, api_key: Option<String>) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(SINK_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/audit-logs", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Send a record to the sink without waiting for the outcome.
    ///
    /// The caller observes no result; failures are visible only in the
    /// local logs.
    pub fn emit(&self, record: AuditRecord) {
        let Some(api_key) = self.api_key.clone() else {
            tracing::warn!("AUDIT_API_KEY not configured: skipping audit log");
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            let result = client
                .post(&endpoint)
                .bearer_auth(api_key)
                .json(&record)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    tracing::warn!(%status, "audit sink rejected record: {body}");
                }
                Err(e) => {
                    tracing::warn!("failed to deliver audit record: {e}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_normalized() {
        let emitter = AuditEmitter::new("http://localhost:8000/", None).unwrap();
        assert_eq!(emitter.endpoint, "http://localhost:8000/v1/audit-logs");

        let emitter = AuditEmitter::new("http://localhost:8000", None).unwrap();
        assert_eq!(emitter.endpoint, "http://localhost:8000/v1/audit-logs");
    }

    #[tokio::test]
    async fn emit_without_credential_is_a_no_op() {
        use crate::models::audit::{AuditAction, AuditRecord};

        let emitter = AuditEmitter::new("http://localhost:8000", None).unwrap();
        // Must not panic or spawn anything that outlives the call
        emitter.emit(AuditRecord::new(
            AuditAction::Create,
            "shipments",
            uuid::Uuid::new_v4(),
        ));
    }
}
