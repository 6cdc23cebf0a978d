//! Provider trait definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::errors::DivertError;

/// Where a provider client is pointed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub region: String,
    /// Optional custom endpoint URL (for LocalStack or other SES-compatible services)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Provider's message ID
    pub message_id: String,
}

/// A transactional email service that accepts fully formed MIME messages
#[async_trait]
pub trait RawEmailProvider: Send + Sync {
    /// Submit `raw_message` as-is.
    ///
    /// `source` is a bare address; display names belong in the raw headers.
    async fn send_raw(
        &self,
        source: &str,
        destinations: &[String],
        raw_message: &[u8],
    ) -> Result<SendReceipt, DivertError>;

    /// Short provider name used in logs
    fn name(&self) -> &'static str;
}

/// Builds provider clients from per-send credentials
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Construct a client. Implementations must not perform network calls here.
    async fn create(
        &self,
        credentials: Credentials,
        settings: &ProviderSettings,
    ) -> Result<Box<dyn RawEmailProvider>, DivertError>;
}
