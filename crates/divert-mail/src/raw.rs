//! Raw MIME message assembly for the provider's raw-send API

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::encoding::encode_text;
use crate::message::Address;
use crate::normalizer::{Body, NormalizedMessage};

const BOUNDARY_SALT: &[u8] = b"divert-mail";
const CRLF: &str = "\r\n";

/// A complete message: header block, blank line, one MIME part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    boundary: String,
    data: String,
}

impl RawMessage {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<RawMessage> for Vec<u8> {
    fn from(message: RawMessage) -> Self {
        message.data.into_bytes()
    }
}

/// Build the raw message for a normalized envelope
pub fn build_message(message: &NormalizedMessage) -> RawMessage {
    build(
        &message.subject,
        &message.from,
        &message.to,
        &message.reply_to,
        &message.body,
    )
}

/// Assemble headers and the single body part around a fresh boundary
pub fn build(
    subject: &str,
    from: &Address,
    to: &Address,
    reply_to: &Address,
    body: &Body,
) -> RawMessage {
    let boundary = unique_boundary(&body.content);
    assemble(subject, from, to, reply_to, body, boundary)
}

fn assemble(
    subject: &str,
    from: &Address,
    to: &Address,
    reply_to: &Address,
    body: &Body,
    boundary: String,
) -> RawMessage {
    let headers = [
        format!("Subject: {}", encode_text(subject)),
        "MIME-Version: 1.0".to_string(),
        format!(
            "Content-Type: multipart/alternative; boundary=\"{}\"",
            boundary
        ),
        format!("To: {}", to.render()),
        format!("From: {}", from.render()),
        format!("Reply-To: {}", reply_to.render()),
    ];

    let mut data = String::with_capacity(body.content.len() + 512);
    for header in &headers {
        data.push_str(header);
        data.push_str(CRLF);
    }
    data.push_str(CRLF);

    data.push_str(&format!("--{}{}", boundary, CRLF));
    data.push_str(&format!("Content-Type: {}{}", body.kind.content_type(), CRLF));
    data.push_str(CRLF);
    data.push_str(&body.content);
    data.push_str(CRLF);
    data.push_str(CRLF);
    data.push_str(&format!("--{}--{}", boundary, CRLF));

    RawMessage { boundary, data }
}

/// Boundary derived from a random seed and the current time, regenerated
/// until it does not occur inside `content`
fn unique_boundary(content: &str) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let token = boundary_token(rng.gen(), Utc::now().timestamp_millis());
        if !content.contains(&token) {
            return token;
        }
    }
}

/// `=_` cannot appear in quoted-printable or base64 output, which keeps the
/// token clear of encoded bodies.
fn boundary_token(seed: u64, timestamp_millis: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(timestamp_millis.to_le_bytes());
    hasher.update(BOUNDARY_SALT);
    let digest = hasher.finalize();

    format!("=_{}", hex::encode(&digest[..20]))
}
