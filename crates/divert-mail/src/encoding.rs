//! Header value encoding (RFC 2047 encoded words, RFC 5322 quoting)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Longest UTF-8 chunk per encoded word; 45 bytes encode to 60 base64
/// characters, which keeps each word under the 75 character limit.
const ENCODED_WORD_CHUNK: usize = 45;

const SPECIALS: &[char] = &['(', ')', '<', '>', '[', ']', ':', ';', '@', '\\', ',', '.', '"'];

/// Replace line breaks so a value cannot start a new header
pub fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

/// Encode an unstructured header value (such as `Subject`)
pub fn encode_text(value: &str) -> String {
    let value = single_line(value);
    if needs_encoded_words(&value) {
        encoded_words(&value)
    } else {
        value
    }
}

/// Encode a display name for use in front of `<address>`
pub fn encode_phrase(name: &str) -> String {
    let name = single_line(name);
    if needs_encoded_words(&name) {
        encoded_words(&name)
    } else if name.contains(SPECIALS) {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        name
    }
}

/// Non-ASCII text, or ASCII text a MIME parser would read as an encoded word
fn needs_encoded_words(value: &str) -> bool {
    !value.is_ascii() || value.contains("=?")
}

fn encoded_words(value: &str) -> String {
    let mut words = Vec::new();
    let mut chunk = String::new();

    for c in value.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }

    words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?utf-8?B?{}?=", BASE64.encode(chunk.as_bytes()))
}
