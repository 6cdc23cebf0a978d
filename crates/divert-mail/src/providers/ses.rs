//! AWS SES raw-send provider

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::{
    config::{Credentials as AwsCredentials, Region},
    error::ProvideErrorMetadata,
    primitives::Blob,
    types::{Destination, EmailContent, RawMessage},
    Client,
};
use tracing::debug;

use super::traits::{ProviderFactory, ProviderSettings, RawEmailProvider, SendReceipt};
use crate::credentials::Credentials;
use crate::errors::DivertError;

/// SES API the client speaks. The SDK crate version pins the wire format, so
/// this never comes from configuration.
pub const SES_API_VERSION: &str = "2019-09-27";

/// Flatten an SDK error into a message fit for the failure log
fn extract_ses_error_details<E>(e: &aws_sdk_sesv2::error::SdkError<E>) -> String
where
    E: ProvideErrorMetadata + std::fmt::Display + std::fmt::Debug,
{
    use aws_sdk_sesv2::error::SdkError;

    match e {
        SdkError::ServiceError(service_err) => {
            let err = service_err.err();
            match (err.code(), err.message()) {
                (Some(code), Some(message)) => format!("{}: {}", code, message),
                (Some(code), None) => code.to_string(),
                _ => format!("{}", err),
            }
        }
        SdkError::TimeoutError(_) => "Request to AWS SES timed out".to_string(),
        SdkError::DispatchFailure(dispatch_err) => {
            if dispatch_err.is_io() {
                "Network error: unable to connect to AWS SES".to_string()
            } else if dispatch_err.is_timeout() {
                "Connection to AWS SES timed out".to_string()
            } else if dispatch_err.is_user() {
                format!("Configuration error: {:?}", dispatch_err)
            } else {
                format!("Connection failed: {:?}", dispatch_err)
            }
        }
        SdkError::ConstructionFailure(_) => "Invalid SES request".to_string(),
        SdkError::ResponseError(resp_err) => {
            format!("Unexpected response from AWS: {:?}", resp_err)
        }
        _ => format!("{:?}", e),
    }
}

/// SES client bound to one set of credentials and one region
pub struct SesProvider {
    client: Client,
    region: String,
}

impl SesProvider {
    pub async fn new(credentials: Credentials, settings: &ProviderSettings) -> Self {
        let creds = AwsCredentials::new(
            credentials.access_key,
            credentials.secret_key,
            None,
            None,
            "divert-mail",
        );

        let mut config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(creds);

        if let Some(ref endpoint_url) = settings.endpoint_url {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        let config = config_builder.load().await;

        debug!(
            "Created SES client (API {}) in region {}",
            SES_API_VERSION, settings.region
        );

        Self {
            client: Client::new(&config),
            region: settings.region.clone(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn api_version(&self) -> &'static str {
        SES_API_VERSION
    }
}

#[async_trait]
impl RawEmailProvider for SesProvider {
    async fn send_raw(
        &self,
        source: &str,
        destinations: &[String],
        raw_message: &[u8],
    ) -> Result<SendReceipt, DivertError> {
        debug!(
            "Sending raw message via SES ({}) from {} to {:?}",
            self.region, source, destinations
        );

        let raw = RawMessage::builder()
            .data(Blob::new(raw_message.to_vec()))
            .build()
            .map_err(|e| DivertError::Send(format!("Failed to build raw message: {}", e)))?;

        let destination = Destination::builder()
            .set_to_addresses(Some(destinations.to_vec()))
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(source)
            .destination(destination)
            .content(EmailContent::builder().raw(raw).build())
            .send()
            .await
            .map_err(|e| DivertError::Send(extract_ses_error_details(&e)))?;

        let message_id = result
            .message_id()
            .ok_or_else(|| DivertError::Send("No message ID returned".to_string()))?
            .to_string();

        debug!("SES accepted message {}", message_id);

        Ok(SendReceipt { message_id })
    }

    fn name(&self) -> &'static str {
        "ses"
    }
}

/// Builds a [`SesProvider`] per send
#[derive(Debug, Clone, Copy, Default)]
pub struct SesProviderFactory;

#[async_trait]
impl ProviderFactory for SesProviderFactory {
    async fn create(
        &self,
        credentials: Credentials,
        settings: &ProviderSettings,
    ) -> Result<Box<dyn RawEmailProvider>, DivertError> {
        Ok(Box::new(SesProvider::new(credentials, settings).await))
    }
}
