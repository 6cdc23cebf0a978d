//! Provider dispatch with failure containment
//!
//! A provider failure is reported once at critical severity and handed back as
//! a [`DispatchOutcome`] instead of an error. The host's transport is never
//! tried as a fallback.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::errors::DivertError;
use crate::message::Address;
use crate::providers::{RawEmailProvider, SendReceipt};
use crate::raw::RawMessage;

/// Sink for dispatch failures
pub trait FailureReporter: Send + Sync {
    /// Called exactly once per failed dispatch
    fn critical(&self, message: &str, error: &DivertError);
}

/// Reports failures as `tracing` error events tagged `critical = true`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn critical(&self, message: &str, error: &DivertError) {
        error!(critical = true, exception = %error, "{}", message);
    }
}

/// Result of a diverted send as seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum DispatchOutcome {
    Sent(SendReceipt),
    /// The provider rejected the message or could not be reached
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent(_))
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    reporter: Arc<dyn FailureReporter>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(TracingReporter))
    }
}

impl Dispatcher {
    pub fn new(reporter: Arc<dyn FailureReporter>) -> Self {
        Self { reporter }
    }

    /// Submit the raw message, surfacing provider errors.
    ///
    /// The source is the bare sender address; the destination list holds only
    /// the bare recipient address. An elapsed `timeout` is a send error.
    pub async fn send(
        &self,
        provider: &dyn RawEmailProvider,
        from: &Address,
        to: &Address,
        raw_message: &RawMessage,
        timeout: Option<Duration>,
    ) -> Result<SendReceipt, DivertError> {
        let source = from.email.trim();
        let destinations = vec![to.email.trim().to_string()];

        debug!(
            "Dispatching {} byte message via {} to {}",
            raw_message.len(),
            provider.name(),
            destinations[0]
        );

        let call = provider.send_raw(source, &destinations, raw_message.as_bytes());
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                DivertError::Send(format!("provider call timed out after {:?}", limit))
            })?,
            None => call.await,
        }
    }

    /// Submit the raw message and absorb any failure into the outcome
    pub async fn dispatch(
        &self,
        provider: &dyn RawEmailProvider,
        from: &Address,
        to: &Address,
        raw_message: &RawMessage,
        timeout: Option<Duration>,
    ) -> DispatchOutcome {
        match self.send(provider, from, to, raw_message, timeout).await {
            Ok(receipt) => {
                info!(
                    "Diverted email sent via {}, message_id: {}",
                    provider.name(),
                    receipt.message_id
                );
                DispatchOutcome::Sent(receipt)
            }
            Err(e) => {
                let reason = e.to_string();
                self.reporter.critical(
                    &format!("The email was not sent. Error message: {}", reason),
                    &e,
                );
                DispatchOutcome::Failed { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{Body, BodyKind};
    use crate::providers::MockRawProvider;
    use crate::raw;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        calls: Mutex<Vec<String>>,
    }

    impl FailureReporter for RecordingReporter {
        fn critical(&self, message: &str, _error: &DivertError) {
            self.calls.lock().unwrap().push(message.to_string());
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl RawEmailProvider for SlowProvider {
        async fn send_raw(
            &self,
            _source: &str,
            _destinations: &[String],
            _raw_message: &[u8],
        ) -> Result<SendReceipt, DivertError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(SendReceipt {
                message_id: "late".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn envelope() -> (Address, Address, RawMessage) {
        let from = Address::with_name("shop@example.com", "Shop");
        let to = Address::with_name("jane@example.com", "Jane");
        let body = Body {
            kind: BodyKind::Plain,
            content: "Hello world".to_string(),
        };
        let message = raw::build("Order", &from, &to, &from, &body);
        (from, to, message)
    }

    #[tokio::test]
    async fn test_dispatch_uses_bare_addresses() {
        let provider = MockRawProvider::new();
        let (from, to, message) = envelope();

        let outcome = Dispatcher::default()
            .dispatch(&provider, &from, &to, &message, None)
            .await;

        assert!(outcome.is_sent());
        let sent = provider.last_send().unwrap();
        assert_eq!(sent.source, "shop@example.com");
        assert_eq!(sent.destinations, vec!["jane@example.com".to_string()]);
        assert_eq!(sent.raw_message, message.as_bytes());
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_reported_once_and_absorbed() {
        let provider = MockRawProvider::new()
            .with_send_failure("MessageRejected: Email address is not verified.");
        let reporter = Arc::new(RecordingReporter::default());
        let dispatcher = Dispatcher::new(reporter.clone());
        let (from, to, message) = envelope();

        let outcome = dispatcher
            .dispatch(&provider, &from, &to, &message, None)
            .await;

        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        let calls = reporter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("MessageRejected: Email address is not verified."));
    }

    #[tokio::test]
    async fn test_send_surfaces_provider_error() {
        let provider = MockRawProvider::new().with_send_failure("Throttling");
        let (from, to, message) = envelope();

        let result = Dispatcher::default()
            .send(&provider, &from, &to, &message, None)
            .await;

        assert!(matches!(result, Err(DivertError::Send(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failed_outcome() {
        let reporter = Arc::new(RecordingReporter::default());
        let dispatcher = Dispatcher::new(reporter.clone());
        let (from, to, message) = envelope();

        let outcome = dispatcher
            .dispatch(
                &SlowProvider,
                &from,
                &to,
                &message,
                Some(Duration::from_secs(5)),
            )
            .await;

        match outcome {
            DispatchOutcome::Failed { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(reporter.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let sent = DispatchOutcome::Sent(SendReceipt {
            message_id: "abc".to_string(),
        });
        let json = serde_json::to_value(&sent).unwrap();
        assert_eq!(json["status"], "sent");
        assert_eq!(json["message_id"], "abc");

        let failed = DispatchOutcome::Failed {
            reason: "nope".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "nope");
    }
}
