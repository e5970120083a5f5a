use std::collections::HashSet;
use std::path::Path;
use std::{net::IpAddr, time::Duration};

use tokio_native_tls::TlsConnector as TokioTlsConnector;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{
        LookupIpStrategy, NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig,
        ResolverOpts,
    },
    system_conf::read_system_conf,
};

use super::model::MonitorConfig;
use crate::error::ConfigError;

/// Load the sites file from disk and validate the options block.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&config_str)?;

    log::info!(
        "Loaded {} site(s) from {}",
        config.sites.len(),
        path.display()
    );
    Ok(config)
}

/// Parse a sites file. Per-test validation happens later, when the sites are
/// expanded into probe instructions.
pub fn parse_config(config_str: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = serde_yaml::from_str(config_str)?;

    if config.options.max_parallel_probes == 0 {
        return Err(ConfigError::ZeroParallelism);
    }

    let mut seen = HashSet::new();
    for site in &config.sites {
        if !seen.insert(site.name.as_str()) {
            return Err(ConfigError::DuplicateSite(site.name.clone()));
        }
    }

    for host in &config.options.dns_hosts {
        if host.trim().parse::<IpAddr>().is_err() {
            return Err(ConfigError::InvalidDnsHost(host.clone()));
        }
    }

    Ok(config)
}

/// Setup a TLS connector for certificate inspection.
/// Invalid chains are accepted: the expiry date is what gets checked, and a
/// broken chain would otherwise hide it.
pub fn setup_tls_connector() -> Result<TokioTlsConnector, native_tls::Error> {
    let mut builder = native_tls::TlsConnector::builder();
    builder.danger_accept_invalid_certs(true);
    let connector = builder.build()?;
    Ok(TokioTlsConnector::from(connector))
}

/// Setup a DNS resolver.
/// With `dns_hosts` empty the system configuration (`/etc/resolv.conf`) is
/// used, otherwise the given nameservers are queried over TCP.
/// Both A and AAAA records are always looked up so callers can pin either
/// address family.
pub fn setup_resolver(dns_hosts: &[String]) -> Result<TokioAsyncResolver, ConfigError> {
    let (resolver_config, mut opts) = if dns_hosts.is_empty() {
        read_system_conf()?
    } else {
        let mut name_servers = NameServerConfigGroup::new();

        for host in dns_hosts {
            let ip: IpAddr = host
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidDnsHost(host.clone()))?;
            name_servers.push(NameServerConfig {
                socket_addr: (ip, 53).into(),
                protocol: Protocol::Tcp,
                tls_dns_name: None,
                trust_negative_responses: false,
                bind_addr: None,
            });
        }

        log::info!("Using DNS hosts: {:?}", dns_hosts);
        (
            ResolverConfig::from_parts(None, vec![], name_servers),
            ResolverOpts::default(),
        )
    };

    opts.attempts = 2;
    opts.timeout = Duration::from_secs(2);
    opts.cache_size = 1024;
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}
