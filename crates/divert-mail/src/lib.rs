//! Outbound mail diversion to AWS SES
//!
//! [`MailInterceptor`] sits in front of an application's normal send path.
//! When diversion is disabled for the configuration scope it calls the
//! original transport and nothing else. When enabled it:
//! - extracts sender, recipient, reply-to, subject and body from the composed message
//! - assembles a raw MIME message with a single body part
//! - resolves credentials (decrypting the stored secret) and a fresh SES client
//! - sends the raw message, logging provider failures instead of raising them
//!
//! A provider failure on the diverted path means the mail is silently not
//! delivered as far as the host is concerned; it is visible only through the
//! [`FailureReporter`] (by default a `tracing` error event) and the returned
//! [`DispatchOutcome`].

pub mod credentials;
pub mod dispatcher;
mod encoding;
pub mod errors;
pub mod gate;
pub mod message;
pub mod normalizer;
pub mod providers;
pub mod raw;
pub mod settings;

// Re-export main types
pub use credentials::{CredentialResolver, Credentials, SecretDecryptor};
pub use dispatcher::{DispatchOutcome, Dispatcher, FailureReporter, TracingReporter};
pub use errors::{AddressField, DivertError};
pub use gate::{route, MailInterceptor, Route, Routed};
pub use message::{Address, ComposedMessage, OutgoingMessage};
pub use normalizer::{normalize, Body, BodyKind, NormalizedMessage};
pub use providers::{
    ProviderFactory, ProviderSettings, RawEmailProvider, SendReceipt, SesProvider,
    SesProviderFactory, SES_API_VERSION,
};
pub use raw::RawMessage;
pub use settings::{env_config_store, MailConfiguration};
