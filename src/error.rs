use std::path::PathBuf;

use thiserror::Error;

/// Problems with the sites file itself. Any of these aborts the whole run
/// before a single probe is issued.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read sites file \"{path}\": {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid sites file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Do not specify protocol in url: \"{0}\"")]
    SchemeInUrl(String),

    #[error("Cannot determine host name of url \"{0}\"")]
    MissingHost(String),

    #[error("No protocols listed for a test of url \"{0}\"")]
    NoProtocols(String),

    #[error("\"return string\" check specified but \"expected string\" is not defined for site \"{0}\"!")]
    MissingExpectedString(String),

    #[error("\"redirect\" check specified but \"canonical address\" is not defined for site \"{0}\"!")]
    MissingCanonicalAddress(String),

    #[error("Site \"{0}\" is defined more than once")]
    DuplicateSite(String),

    #[error("\"max parallel probes\" must be greater than zero")]
    ZeroParallelism,

    #[error("Invalid DNS host \"{0}\"")]
    InvalidDnsHost(String),

    #[error("Cannot read system resolver configuration: {0}")]
    SystemResolver(#[from] std::io::Error),
}
