pub mod action;
pub mod expiry;
pub mod matrix;
pub mod orchestrator;
pub mod outcome;
pub mod site;

pub use action::Action;
pub use matrix::{Instruction, SitePlan, expand_all, expand_site};
pub use orchestrator::{Orchestrator, RunSummary, SETTLE_INTERVAL};
pub use outcome::{TestOutcome, Verdict};
pub use site::{Executor, SiteResult, run_site};

use chrono::Utc;

use crate::http_probe::{CertificateInspector, Prober};

/// Executes instructions against the network.
#[derive(Clone)]
pub struct Checker {
    prober: Prober,
    inspector: CertificateInspector,
}

impl Checker {
    pub fn new(prober: Prober, inspector: CertificateInspector) -> Self {
        Self { prober, inspector }
    }
}

impl Executor for Checker {
    async fn execute(&self, instruction: &Instruction) -> TestOutcome {
        let verdict = match instruction {
            Instruction::Certificate { host, weeks } => match self.inspector.not_after(host).await {
                Ok(not_after) => expiry::check_expiry(not_after, Utc::now(), *weeks),
                Err(e) => {
                    log::warn!("Certificate check for {host} failed: {e}");
                    Verdict::fail(e)
                }
            },
            Instruction::Http {
                url,
                action,
                protocol,
                family,
            } => match self.prober.probe(*protocol, url, *family).await {
                Ok(response) => action.evaluate(&response.head, &response.body),
                Err(failure) => {
                    log::warn!("Probe of {url} over {family} failed: {failure}");
                    Verdict::fail(failure)
                }
            },
        };

        if let Verdict::Fail(reason) = &verdict {
            log::debug!("{}: {reason}", instruction.describe());
        }
        TestOutcome::from(verdict)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use trust_dns_resolver::TokioAsyncResolver;
    use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};

    use crate::config::{Protocol, setup_tls_connector};
    use crate::http_probe::IpFamily;

    use super::*;

    fn checker() -> Checker {
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        let prober = Prober::new(resolver.clone()).unwrap();
        let inspector = CertificateInspector::new(setup_tls_connector().unwrap(), resolver);
        Checker::new(prober, inspector)
    }

    #[tokio::test]
    async fn test_probe_is_evaluated() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\nConnection: close\r\n\r\nHello, world!")
                .await
                .unwrap();
            let _ = socket.shutdown().await;
        });

        let instruction = Instruction::Http {
            url: addr.to_string(),
            action: Action::ReturnString {
                expected: "world".to_string(),
            },
            protocol: Protocol::NoTls,
            family: IpFamily::V4,
        };
        let outcome = checker().execute(&instruction).await;
        assert!(outcome.success, "{}", outcome.machine_message);
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_outcome() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let instruction = Instruction::Http {
            url: addr.to_string(),
            action: Action::HttpSuccess,
            protocol: Protocol::NoTls,
            family: IpFamily::V4,
        };
        let outcome = checker().execute(&instruction).await;
        assert!(!outcome.success);
        assert!(outcome.machine_message.starts_with("  Test Fail! "));
    }
}
