//! Error types for mail diversion

use thiserror::Error;

/// Failures of the diversion path.
///
/// Everything except [`DivertError::Send`] aborts the diversion before any
/// provider call is made. `Send` is produced by the dispatcher and is absorbed
/// there; the interception gate never returns it to the host.
#[derive(Error, Debug)]
pub enum DivertError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Message has no {0} address")]
    MissingAddress(AddressField),

    #[error("Message parse error: {0}")]
    Parse(String),

    #[error("Send error: {0}")]
    Send(String),
}

/// Envelope field a message must carry to be diverted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    From,
    To,
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressField::From => write!(f, "From"),
            AddressField::To => write!(f, "To"),
        }
    }
}

impl From<mailparse::MailParseError> for DivertError {
    fn from(err: mailparse::MailParseError) -> Self {
        DivertError::Parse(err.to_string())
    }
}
