use std::fmt;
use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::Regex;

use super::header::{ResponseHead, decode_latin1};
use super::result::ProbeFailure;

static CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"charset=([^\s;]+)").expect("valid charset pattern"));

/// IANA names and aliases of ISO-8859-1. encoding_rs folds all of them into
/// windows-1252, which disagrees on 0x80..=0x9f.
const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "iso_8859-1:1987",
    "iso-ir-100",
    "latin1",
    "latin-1",
    "l1",
    "cp819",
    "ibm819",
    "csisolatin1",
];

/// How a response body is turned into text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyEncoding {
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    Other(&'static Encoding),
}

impl BodyEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            BodyEncoding::Latin1 => "ISO-8859-1",
            BodyEncoding::Other(encoding) => encoding.name(),
        }
    }

    /// Decode `body`. Malformed sequences are replaced, not fatal.
    pub fn decode(&self, body: &[u8]) -> String {
        match self {
            BodyEncoding::Latin1 => decode_latin1(body),
            BodyEncoding::Other(encoding) => {
                let (text, had_errors) = encoding.decode_without_bom_handling(body);
                if had_errors {
                    log::debug!("Body is not valid {}, replaced malformed bytes", encoding.name());
                }
                text.into_owned()
            }
        }
    }
}

impl fmt::Display for BodyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `charset` parameter of the `Content-Type` header, lowercased.
pub fn charset_label(head: &ResponseHead) -> Option<String> {
    let content_type = head.header("content-type")?.to_lowercase();
    let label = CHARSET.captures(&content_type)?.get(1)?.as_str();
    let label = label.trim_matches(|c| c == '"' || c == '\'');
    (!label.is_empty()).then(|| label.to_string())
}

/// Body encoding of a response, ISO-8859-1 without a charset parameter.
pub fn resolve_encoding(head: &ResponseHead) -> Result<BodyEncoding, ProbeFailure> {
    let Some(label) = charset_label(head) else {
        return Ok(BodyEncoding::Latin1);
    };
    if LATIN1_LABELS.contains(&label.as_str()) {
        return Ok(BodyEncoding::Latin1);
    }
    Encoding::for_label(label.as_bytes())
        .map(BodyEncoding::Other)
        .ok_or(ProbeFailure::UnsupportedEncoding(label))
}

/// Decode a full response body with the encoding its head declares.
pub fn decode_body(head: &ResponseHead, body: &[u8]) -> Result<String, ProbeFailure> {
    Ok(resolve_encoding(head)?.decode(body))
}
