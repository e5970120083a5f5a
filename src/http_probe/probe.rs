use std::error::Error as StdError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{Client, Response, redirect};
use trust_dns_resolver::TokioAsyncResolver;

use super::encoding::decode_body;
use super::header::HeaderParser;
use super::report;
use super::result::{ProbeFailure, ProbeResponse};
use crate::config::Protocol;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(8);
pub const USER_AGENT: &str = "sitebox";

/// The address family a probe is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn label(&self) -> &'static str {
        match self {
            IpFamily::V4 => "IPv4",
            IpFamily::V6 => "IPv6",
        }
    }

    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpFamily::V4 => ip.is_ipv4(),
            IpFamily::V6 => ip.is_ipv6(),
        }
    }

    fn unspecified(&self) -> IpAddr {
        match self {
            IpFamily::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpFamily::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hostname resolution that only hands out addresses of one family.
struct FamilyResolver {
    resolver: TokioAsyncResolver,
    family: IpFamily,
}

impl Resolve for FamilyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(lookup_family(
            self.resolver.clone(),
            self.family,
            name.as_str().to_string(),
        ))
    }
}

async fn lookup_family(
    resolver: TokioAsyncResolver,
    family: IpFamily,
    host: String,
) -> Result<Addrs, Box<dyn StdError + Send + Sync>> {
    let lookup = resolver.lookup_ip(host.as_str()).await?;
    let addrs: Vec<SocketAddr> = lookup
        .iter()
        .filter(|ip| family.matches(ip))
        .map(|ip| SocketAddr::new(ip, 0))
        .collect();

    if addrs.is_empty() {
        return Err(format!("no {family} address found for {host}").into());
    }
    log::debug!("Resolved {host} over {family} to {addrs:?}");
    Ok(Box::new(addrs.into_iter()))
}

/// Issues single requests pinned to one address family, without following
/// redirects.
#[derive(Clone)]
pub struct Prober {
    v4: Client,
    v6: Client,
}

impl Prober {
    pub fn new(resolver: TokioAsyncResolver) -> Result<Self, reqwest::Error> {
        Ok(Self {
            v4: build_client(&resolver, IpFamily::V4)?,
            v6: build_client(&resolver, IpFamily::V6)?,
        })
    }

    fn client(&self, family: IpFamily) -> &Client {
        match family {
            IpFamily::V4 => &self.v4,
            IpFamily::V6 => &self.v6,
        }
    }

    /// Fetch `url` (which carries no scheme) over `protocol`.
    pub async fn probe(
        &self,
        protocol: Protocol,
        url: &str,
        family: IpFamily,
    ) -> Result<ProbeResponse, ProbeFailure> {
        let target = format!("{}://{}", protocol.scheme(), url);
        log::debug!("Probing {target} over {family}");

        let response = self
            .client(family)
            .get(&target)
            .send()
            .await
            .map_err(|e| ProbeFailure::Transport(report(&e)))?;

        let mut parser = HeaderParser::new();
        for line in wire_head(&response) {
            parser.feed(&line);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeFailure::Transport(report(&e)))?;

        let head = parser.finish().ok_or(ProbeFailure::MissingStatus)?;
        let body = decode_body(&head, &body)?;
        log::debug!("{target} over {family} answered {}", head.status());

        Ok(ProbeResponse {
            url: target,
            head,
            body,
        })
    }
}

fn build_client(resolver: &TokioAsyncResolver, family: IpFamily) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(PROBE_TIMEOUT)
        .redirect(redirect::Policy::none())
        .user_agent(USER_AGENT)
        .local_address(family.unspecified())
        .dns_resolver(Arc::new(FamilyResolver {
            resolver: resolver.clone(),
            family,
        }))
        .build()
}

/// The response head as it appeared on the wire: status line first, then
/// one `name: value` line per header value.
fn wire_head(response: &Response) -> Vec<Vec<u8>> {
    let mut lines = Vec::with_capacity(response.headers().len() + 1);
    lines.push(format!("{:?} {}\r\n", response.version(), response.status()).into_bytes());

    for (name, value) in response.headers() {
        let mut line = Vec::with_capacity(name.as_str().len() + value.len() + 4);
        line.extend_from_slice(name.as_str().as_bytes());
        line.extend_from_slice(b": ");
        line.extend_from_slice(value.as_bytes());
        line.extend_from_slice(b"\r\n");
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};

    use super::*;

    /// Accept one connection on loopback and answer it with `response`.
    async fn serve_once(response: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket.write_all(response).await.unwrap();
            let _ = socket.shutdown().await;
        });
        addr
    }

    fn resolver() -> TokioAsyncResolver {
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    }

    fn prober() -> Prober {
        Prober::new(resolver()).expect("client builds")
    }

    #[test]
    fn test_family_labels() {
        assert_eq!(IpFamily::V4.to_string(), "IPv4");
        assert_eq!(IpFamily::V6.label(), "IPv6");
        assert!(IpFamily::V4.matches(&"127.0.0.1".parse().unwrap()));
        assert!(!IpFamily::V4.matches(&"::1".parse().unwrap()));
        assert!(IpFamily::V6.matches(&"::1".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_probe_decodes_declared_charset() {
        let addr = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: 12\r\nConnection: close\r\n\r\n<p>café</p>"
                .as_bytes(),
        )
        .await;

        let response = prober()
            .probe(Protocol::NoTls, &format!("{addr}/index.html"), IpFamily::V4)
            .await
            .expect("probe succeeds");
        assert_eq!(response.url, format!("http://{addr}/index.html"));
        assert_eq!(response.head.status(), 200);
        assert_eq!(
            response.head.header("Content-Type"),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(response.body, "<p>café</p>");
    }

    #[tokio::test]
    async fn test_probe_defaults_to_latin1() {
        let addr = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\ncaf\xe9",
        )
        .await;

        let response = prober()
            .probe(Protocol::NoTls, &addr.to_string(), IpFamily::V4)
            .await
            .expect("probe succeeds");
        assert_eq!(response.body, "café");
    }

    #[tokio::test]
    async fn test_probe_does_not_follow_redirects() {
        let addr = serve_once(
            b"HTTP/1.1 301 Moved Permanently\r\nLocation: https://example.com/new\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let response = prober()
            .probe(Protocol::NoTls, &format!("{addr}/old"), IpFamily::V4)
            .await
            .expect("probe succeeds");
        assert_eq!(response.head.status(), 301);
        assert_eq!(response.head.header("location"), Some("https://example.com/new"));
    }

    #[tokio::test]
    async fn test_unknown_charset_is_a_failure() {
        let addr = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=klingon\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        )
        .await;

        let failure = prober()
            .probe(Protocol::NoTls, &addr.to_string(), IpFamily::V4)
            .await
            .unwrap_err();
        assert!(matches!(failure, ProbeFailure::UnsupportedEncoding(_)));
    }

    #[tokio::test]
    async fn test_lookup_keeps_only_the_pinned_family() {
        let v4 = lookup_family(resolver(), IpFamily::V4, "127.0.0.1".to_string()).await;
        let addrs = match v4 {
            Ok(addrs) => addrs.collect::<Vec<_>>(),
            Err(e) => panic!("IPv4 literal should resolve: {e}"),
        };
        assert_eq!(addrs, vec![SocketAddr::from(([127, 0, 0, 1], 0))]);

        let v6 = lookup_family(resolver(), IpFamily::V6, "127.0.0.1".to_string()).await;
        match v6 {
            Ok(addrs) => panic!("IPv6 lookup returned {:?}", addrs.collect::<Vec<_>>()),
            Err(e) => assert_eq!(e.to_string(), "no IPv6 address found for 127.0.0.1"),
        }
    }

    #[tokio::test]
    async fn test_ipv6_client_does_not_reach_ipv4_server() {
        let addr =
            serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;

        let failure = prober()
            .probe(Protocol::NoTls, &addr.to_string(), IpFamily::V6)
            .await
            .unwrap_err();
        assert!(matches!(failure, ProbeFailure::Transport(_)), "{failure:?}");

        let response = prober()
            .probe(Protocol::NoTls, &addr.to_string(), IpFamily::V4)
            .await
            .expect("IPv4 client reaches the IPv4 server");
        assert_eq!(response.head.status(), 200);
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let failure = prober()
            .probe(Protocol::NoTls, &addr.to_string(), IpFamily::V4)
            .await
            .unwrap_err();
        assert!(matches!(failure, ProbeFailure::Transport(_)));
        assert!(!failure.to_string().is_empty());
    }
}
