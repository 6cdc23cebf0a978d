//! Interception gate in front of the host's mail transport

use divert_core::{ConfigScope, ConfigStore};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::credentials::{CredentialResolver, SecretDecryptor};
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::errors::DivertError;
use crate::message::{ComposedMessage, OutgoingMessage};
use crate::normalizer::normalize;
use crate::providers::SesProviderFactory;
use crate::raw::build_message;
use crate::settings::MailConfiguration;

/// Which path a send takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Hand the message to the original transport untouched
    Delegate,
    /// Send through the provider; the original transport is not called
    Divert,
}

/// Decide the route for a configuration snapshot
pub fn route(config: &MailConfiguration) -> Route {
    if config.enabled {
        Route::Divert
    } else {
        Route::Delegate
    }
}

/// What happened to a message that went through the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed<T> {
    /// The original transport ran and returned `T`
    Delegated(T),
    Diverted(DispatchOutcome),
}

/// Wraps the host's send operation and diverts it to the provider when enabled.
///
/// Holds no per-send state: configuration, credentials, the provider client
/// and the raw message are all created inside each call, so one interceptor
/// can serve concurrent sends.
#[derive(Clone)]
pub struct MailInterceptor {
    config: Arc<dyn ConfigStore>,
    resolver: CredentialResolver,
    dispatcher: Dispatcher,
}

impl MailInterceptor {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        resolver: CredentialResolver,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            resolver,
            dispatcher,
        }
    }

    /// Interceptor sending through AWS SES and reporting failures via `tracing`
    pub fn ses(config: Arc<dyn ConfigStore>, decryptor: Arc<dyn SecretDecryptor>) -> Self {
        Self::new(
            config,
            CredentialResolver::new(decryptor, Arc::new(SesProviderFactory)),
            Dispatcher::default(),
        )
    }

    /// Send `message`, either through `original` or through the provider.
    ///
    /// `original` is only invoked when diversion is disabled for `scope`, and
    /// its result is returned unchanged. On the diverted path, configuration,
    /// decryption and addressing problems are returned as errors before any
    /// provider call; a provider failure is not an error (see
    /// [`Dispatcher::dispatch`]).
    pub async fn send<M, F, Fut, T>(
        &self,
        scope: &ConfigScope,
        message: &M,
        original: F,
    ) -> Result<Routed<T>, DivertError>
    where
        M: ComposedMessage + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let config = MailConfiguration::load(self.config.as_ref(), scope);

        match route(&config) {
            Route::Delegate => {
                debug!("Diversion disabled for scope {}, delegating", scope);
                Ok(Routed::Delegated(original().await))
            }
            Route::Divert => self.divert(&config, message).await.map(Routed::Diverted),
        }
    }

    /// Gate for a `lettre` transport: the message is handed to `transport`
    /// when diversion is disabled.
    pub async fn send_lettre<T>(
        &self,
        scope: &ConfigScope,
        transport: &T,
        message: lettre::Message,
    ) -> Result<Routed<Result<T::Ok, T::Error>>, DivertError>
    where
        T: lettre::AsyncTransport + Sync,
    {
        let config = MailConfiguration::load(self.config.as_ref(), scope);

        match route(&config) {
            Route::Delegate => {
                debug!("Diversion disabled for scope {}, delegating", scope);
                Ok(Routed::Delegated(transport.send(message).await))
            }
            Route::Divert => {
                let outgoing = OutgoingMessage::try_from(&message)?;
                self.divert(&config, &outgoing)
                    .await
                    .map(Routed::Diverted)
            }
        }
    }

    /// Normalize, build and dispatch one message
    pub async fn divert<M>(
        &self,
        config: &MailConfiguration,
        message: &M,
    ) -> Result<DispatchOutcome, DivertError>
    where
        M: ComposedMessage + ?Sized,
    {
        let normalized = normalize(message)?;
        let raw_message = build_message(&normalized);

        let provider = self.resolver.resolve(config).await?;

        info!(
            "Diverting email from {} to {} via {}",
            normalized.from.email,
            normalized.to.email,
            provider.name()
        );

        Ok(self
            .dispatcher
            .dispatch(
                provider.as_ref(),
                &normalized.from,
                &normalized.to,
                &raw_message,
                config.dispatch_timeout(),
            )
            .await)
    }
}
