use thiserror::Error;

use super::header::ResponseHead;

/// A fully received response with its body decoded to text.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub url: String,
    pub head: ResponseHead,
    pub body: String,
}

/// Why a probe produced no usable response. Always reported as a failed
/// test, never propagated.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("{0}")]
    Transport(String),

    #[error("Can't get HTTP response code!")]
    MissingStatus,

    #[error("unsupported body encoding: {0}")]
    UnsupportedEncoding(String),
}
