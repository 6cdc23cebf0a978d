//! Composed messages as seen by the interception layer

use mailparse::{DispositionType, MailAddr, MailHeaderMap, ParsedMail};
use serde::{Deserialize, Serialize};

use crate::encoding::{encode_phrase, single_line};
use crate::errors::DivertError;

/// A mailbox: address plus optional display name.
///
/// The display name is stored unquoted; rendering takes care of quoting and
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Address {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_name(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: Some(display_name.into()),
        }
    }

    /// `Name <email>` when a display name is present, bare `email` otherwise
    pub fn render(&self) -> String {
        let email = single_line(self.email.trim());
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} <{}>", encode_phrase(name), email),
            _ => email,
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Accessors the interception layer needs from a host's composed message
pub trait ComposedMessage {
    /// Sender mailboxes; the first one is used
    fn from_addresses(&self) -> Vec<Address>;
    /// Recipient mailboxes; the first one is used
    fn to_addresses(&self) -> Vec<Address>;
    /// Declared reply-to mailboxes, possibly empty
    fn reply_to_addresses(&self) -> Vec<Address>;
    fn subject(&self) -> String;
    fn body(&self) -> String;
}

/// Owned composed message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    #[serde(default)]
    pub reply_to: Vec<Address>,
    pub subject: String,
    pub body: String,
}

impl OutgoingMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from(mut self, address: Address) -> Self {
        self.from.push(address);
        self
    }

    pub fn with_to(mut self, address: Address) -> Self {
        self.to.push(address);
        self
    }

    pub fn with_reply_to(mut self, address: Address) -> Self {
        self.reply_to.push(address);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Read a message from its RFC 5322 wire form.
    ///
    /// For multipart messages the body is the first inline `text/html` part,
    /// falling back to the first inline `text/plain` part. Trailing line
    /// breaks are stripped from the body; the raw builder appends its own.
    pub fn from_raw(raw: &[u8]) -> Result<Self, DivertError> {
        let parsed = mailparse::parse_mail(raw)?;

        Ok(Self {
            from: header_addresses(&parsed, "From")?,
            to: header_addresses(&parsed, "To")?,
            reply_to: header_addresses(&parsed, "Reply-To")?,
            subject: parsed
                .headers
                .get_first_value("Subject")
                .unwrap_or_default(),
            body: select_body(&parsed)?,
        })
    }
}

impl ComposedMessage for OutgoingMessage {
    fn from_addresses(&self) -> Vec<Address> {
        self.from.clone()
    }

    fn to_addresses(&self) -> Vec<Address> {
        self.to.clone()
    }

    fn reply_to_addresses(&self) -> Vec<Address> {
        self.reply_to.clone()
    }

    fn subject(&self) -> String {
        self.subject.clone()
    }

    fn body(&self) -> String {
        self.body.clone()
    }
}

impl TryFrom<&lettre::Message> for OutgoingMessage {
    type Error = DivertError;

    fn try_from(message: &lettre::Message) -> Result<Self, Self::Error> {
        Self::from_raw(&message.formatted())
    }
}

fn header_addresses(parsed: &ParsedMail<'_>, name: &str) -> Result<Vec<Address>, DivertError> {
    let Some(header) = parsed.headers.get_first_header(name) else {
        return Ok(Vec::new());
    };

    let list = mailparse::addrparse_header(header)?;
    let mut addresses = Vec::new();
    for addr in list.iter() {
        match addr {
            MailAddr::Single(info) => addresses.push(Address {
                email: info.addr.clone(),
                display_name: info.display_name.clone(),
            }),
            MailAddr::Group(group) => {
                addresses.extend(group.addrs.iter().map(|info| Address {
                    email: info.addr.clone(),
                    display_name: info.display_name.clone(),
                }));
            }
        }
    }

    Ok(addresses)
}

fn select_body(parsed: &ParsedMail<'_>) -> Result<String, DivertError> {
    let part = find_part(parsed, "text/html")
        .or_else(|| find_part(parsed, "text/plain"))
        .unwrap_or(parsed);

    let body = part.get_body()?;
    Ok(body.trim_end_matches(['\r', '\n']).to_string())
}

fn find_part<'b, 'a>(mail: &'b ParsedMail<'a>, mimetype: &str) -> Option<&'b ParsedMail<'a>> {
    if mail.subparts.is_empty() {
        let inline = mail.get_content_disposition().disposition != DispositionType::Attachment;
        (inline && mail.ctype.mimetype.eq_ignore_ascii_case(mimetype)).then_some(mail)
    } else {
        mail.subparts
            .iter()
            .find_map(|part| find_part(part, mimetype))
    }
}
