//! Envelope extraction and body classification

use serde::{Deserialize, Serialize};

use crate::errors::{AddressField, DivertError};
use crate::message::{Address, ComposedMessage};

/// Content kind of the single body part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Html,
    Plain,
}

impl BodyKind {
    /// Markup sniffing over the body text. Escaped markup shown as literal
    /// text is classified as HTML too; no declared content type is consulted.
    pub fn classify(content: &str) -> Self {
        let lower = content.to_ascii_lowercase();
        if lower.contains("<html") || lower.contains("!doctype html") || lower.contains("<body") {
            BodyKind::Html
        } else {
            BodyKind::Plain
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            BodyKind::Html => "text/html; charset=utf-8",
            BodyKind::Plain => "text/plain; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub kind: BodyKind,
    pub content: String,
}

/// Envelope and content ready for the raw message builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub from: Address,
    pub to: Address,
    pub reply_to: Address,
    pub subject: String,
    pub body: Body,
}

/// Extract the envelope from a composed message.
///
/// The first From and To entries are used and must have a non-empty address.
/// Reply-To is the first declared entry with a non-blank address; entries
/// with a blank address are skipped, and the sender is used when none is left.
pub fn normalize<M>(message: &M) -> Result<NormalizedMessage, DivertError>
where
    M: ComposedMessage + ?Sized,
{
    let from = first_address(message.from_addresses(), AddressField::From)?;
    let to = first_address(message.to_addresses(), AddressField::To)?;

    let reply_to = message
        .reply_to_addresses()
        .into_iter()
        .find(|a| !a.email.trim().is_empty())
        .unwrap_or_else(|| from.clone());

    let content = message.body();
    let kind = BodyKind::classify(&content);

    Ok(NormalizedMessage {
        from,
        to,
        reply_to,
        subject: message.subject(),
        body: Body { kind, content },
    })
}

fn first_address(addresses: Vec<Address>, field: AddressField) -> Result<Address, DivertError> {
    addresses
        .into_iter()
        .next()
        .filter(|a| !a.email.trim().is_empty())
        .ok_or(DivertError::MissingAddress(field))
}
