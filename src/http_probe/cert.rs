use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector as TokioTlsConnector;
use trust_dns_resolver::TokioAsyncResolver;
use x509_parser::parse_x509_certificate;

use super::probe::PROBE_TIMEOUT;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("cannot resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("no address found for {0}")]
    NoAddress(String),

    #[error("connection to {host}:443 failed: {reason}")]
    Connect { host: String, reason: String },

    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    #[error("{0} presented no certificate")]
    NoCertificate(String),

    #[error("cannot parse certificate: {0}")]
    Parse(String),

    #[error("certificate check for {0} timed out")]
    Timeout(String),
}

/// Fetches the leaf certificate of a host on port 443.
/// Connects by hostname over whichever address family resolves first.
#[derive(Clone)]
pub struct CertificateInspector {
    connector: TokioTlsConnector,
    resolver: TokioAsyncResolver,
}

impl CertificateInspector {
    pub fn new(connector: TokioTlsConnector, resolver: TokioAsyncResolver) -> Self {
        Self {
            connector,
            resolver,
        }
    }

    /// The "not valid after" instant of the certificate `host` presents.
    pub async fn not_after(&self, host: &str) -> Result<DateTime<Utc>, CertificateError> {
        tokio::time::timeout(PROBE_TIMEOUT, self.fetch_not_after(host))
            .await
            .map_err(|_| CertificateError::Timeout(host.to_string()))?
    }

    async fn fetch_not_after(&self, host: &str) -> Result<DateTime<Utc>, CertificateError> {
        let lookup_host = host.trim_start_matches('[').trim_end_matches(']');
        let ip = self
            .resolver
            .lookup_ip(lookup_host)
            .await
            .map_err(|e| CertificateError::Resolve {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .iter()
            .next()
            .ok_or_else(|| CertificateError::NoAddress(host.to_string()))?;

        let stream = TcpStream::connect(SocketAddr::new(ip, 443))
            .await
            .map_err(|e| CertificateError::Connect {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let tls_stream = self
            .connector
            .connect(lookup_host, stream)
            .await
            .map_err(|e| CertificateError::Handshake {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let cert = tls_stream
            .get_ref()
            .peer_certificate()
            .map_err(|e| CertificateError::Handshake {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| CertificateError::NoCertificate(host.to_string()))?;

        let der = cert
            .to_der()
            .map_err(|e| CertificateError::Parse(e.to_string()))?;

        let not_after = parse_not_after(&der)?;
        log::debug!("Certificate of {host} is valid until {not_after}");
        Ok(not_after)
    }
}

/// Extract the expiry instant from a DER-encoded certificate.
pub fn parse_not_after(der: &[u8]) -> Result<DateTime<Utc>, CertificateError> {
    let (_, parsed) =
        parse_x509_certificate(der).map_err(|e| CertificateError::Parse(e.to_string()))?;

    let timestamp = parsed.validity().not_after.timestamp();
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| CertificateError::Parse(format!("expiry timestamp {timestamp} out of range")))
}
