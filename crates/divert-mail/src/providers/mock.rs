//! Mock provider for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::credentials::Credentials;
use crate::errors::DivertError;
use crate::providers::{ProviderFactory, ProviderSettings, RawEmailProvider, SendReceipt};

/// One recorded `send_raw` call
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub source: String,
    pub destinations: Vec<String>,
    pub raw_message: Vec<u8>,
}

/// Mock provider recording every raw send
#[derive(Debug, Clone, Default)]
pub struct MockRawProvider {
    pub send_count: Arc<AtomicUsize>,
    pub sent: Arc<Mutex<Vec<RecordedSend>>>,
    /// When set, every send fails with this provider message
    pub failure: Option<String>,
}

impl MockRawProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_send_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn send_call_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn last_send(&self) -> Option<RecordedSend> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RawEmailProvider for MockRawProvider {
    async fn send_raw(
        &self,
        source: &str,
        destinations: &[String],
        raw_message: &[u8],
    ) -> Result<SendReceipt, DivertError> {
        let n = self.send_count.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(RecordedSend {
            source: source.to_string(),
            destinations: destinations.to_vec(),
            raw_message: raw_message.to_vec(),
        });

        if let Some(ref message) = self.failure {
            return Err(DivertError::Send(message.clone()));
        }

        Ok(SendReceipt {
            message_id: format!("mock-message-{}", n + 1),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out clones of one [`MockRawProvider`]
#[derive(Debug, Clone, Default)]
pub struct MockProviderFactory {
    pub provider: MockRawProvider,
    pub create_count: Arc<AtomicUsize>,
    pub settings: Arc<Mutex<Option<ProviderSettings>>>,
}

impl MockProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: MockRawProvider) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    pub fn create_call_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn last_settings(&self) -> Option<ProviderSettings> {
        self.settings.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderFactory for MockProviderFactory {
    async fn create(
        &self,
        _credentials: Credentials,
        settings: &ProviderSettings,
    ) -> Result<Box<dyn RawEmailProvider>, DivertError> {
        self.create_count.fetch_add(1, Ordering::SeqCst);
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(Box::new(self.provider.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_records_send() {
        let provider = MockRawProvider::new();

        let receipt = provider
            .send_raw("a@example.com", &["b@example.com".to_string()], b"raw")
            .await
            .unwrap();

        assert_eq!(receipt.message_id, "mock-message-1");
        assert_eq!(provider.send_call_count(), 1);
        let sent = provider.last_send().unwrap();
        assert_eq!(sent.source, "a@example.com");
        assert_eq!(sent.destinations, vec!["b@example.com".to_string()]);
        assert_eq!(sent.raw_message, b"raw");
    }

    #[tokio::test]
    async fn test_mock_provider_send_failure() {
        let provider = MockRawProvider::new()
            .with_send_failure("Throttling: Maximum sending rate exceeded.");

        let result = provider
            .send_raw("a@example.com", &["b@example.com".to_string()], b"raw")
            .await;

        assert!(matches!(result, Err(DivertError::Send(m)) if m.contains("Throttling")));
        assert_eq!(provider.send_call_count(), 1);
    }

    #[tokio::test]
    async fn test_factory_clones_share_counters() {
        let factory = MockProviderFactory::new();
        let settings = ProviderSettings {
            region: "us-east-1".to_string(),
            endpoint_url: None,
        };
        let credentials = Credentials {
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
        };

        let client = factory.create(credentials, &settings).await.unwrap();
        client
            .send_raw("a@example.com", &["b@example.com".to_string()], b"raw")
            .await
            .unwrap();

        assert_eq!(factory.create_call_count(), 1);
        assert_eq!(factory.provider.send_call_count(), 1);
    }
}
