use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static STATUS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\AHTTP/[1-9]").expect("valid status line pattern"));
static STATUS_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{3}").expect("valid status code pattern"));

/// Status code and headers of a response.
///
/// Header names are stored lowercased. When a name repeats only the last
/// value is kept: folded and multi-value headers are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: u16,
    headers: HashMap<String, String>,
}

impl ResponseHead {
    pub fn new(status: u16, headers: HashMap<String, String>) -> Self {
        Self { status, headers }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

/// Accumulates raw header lines as they come off the wire.
#[derive(Debug, Default)]
pub struct HeaderParser {
    status: Option<u16>,
    headers: HashMap<String, String>,
}

impl HeaderParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw header line, including its line terminator if present.
    ///
    /// Header bytes are ISO-8859-1, whatever the body encoding is.
    /// Lines without a colon (the blank separator, continuation lines) are
    /// ignored.
    pub fn feed(&mut self, raw: &[u8]) {
        let line = decode_latin1(raw);

        if STATUS_LINE.is_match(&line) {
            if let Some(code) = STATUS_CODE.find(&line) {
                self.status = code.as_str().parse().ok();
            }
            return;
        }

        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        self.headers
            .insert(name.trim().to_lowercase(), value.trim().to_string());
    }

    /// Freeze the accumulated head. `None` if no status line was seen.
    pub fn finish(self) -> Option<ResponseHead> {
        let status = self.status?;
        Some(ResponseHead {
            status,
            headers: self.headers,
        })
    }
}

/// Parse a complete header block in one go.
pub fn parse_head<I, L>(lines: I) -> Option<ResponseHead>
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    let mut parser = HeaderParser::new();
    for line in lines {
        parser.feed(line.as_ref());
    }
    parser.finish()
}

pub(crate) fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}
