use url::Url;

use crate::config::{ActionKind, MonitorConfig, Protocol, SiteConfig};
use crate::error::ConfigError;
use crate::http_probe::IpFamily;

use super::action::Action;

/// One unit of work in a site's test matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Check the TLS certificate of `host` stays valid for `weeks` weeks.
    Certificate { host: String, weeks: u32 },
    /// Fetch `url` over `protocol`, pinned to `family`, and evaluate `action`.
    Http {
        url: String,
        action: Action,
        protocol: Protocol,
        family: IpFamily,
    },
}

impl Instruction {
    /// The line heading this instruction's outcome in reports.
    pub fn describe(&self) -> String {
        match self {
            Instruction::Certificate { host, weeks } => {
                format!("does \"{host}\" have at-least {weeks} weeks before cert expiry?")
            }
            Instruction::Http {
                url,
                action,
                protocol,
                family,
            } => format!(
                "{family}, does \"{url}\" {} over \"{}\"?",
                action.kind().keyword(),
                protocol.keyword()
            ),
        }
    }
}

/// A site's name with its flattened, validated test matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePlan {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

/// Expand every site, failing on the first configuration error.
/// Site names are already unique, `parse_config` enforces it.
pub fn expand_all(config: &MonitorConfig) -> Result<Vec<SitePlan>, ConfigError> {
    config
        .sites
        .iter()
        .map(|site| expand_site(site, config.options.cert_expiry_weeks))
        .collect()
}

/// Flatten a site into instructions: for each url, test and protocol, a
/// certificate check (TLS only, when `cert_expiry_weeks` > 0) followed by
/// one HTTP probe per enabled address family, IPv4 first.
pub fn expand_site(site: &SiteConfig, cert_expiry_weeks: u32) -> Result<SitePlan, ConfigError> {
    let mut families = Vec::with_capacity(2);
    if site.ipv4 {
        families.push(IpFamily::V4);
    }
    if site.ipv6 {
        families.push(IpFamily::V6);
    }

    let mut instructions = Vec::new();
    for url_def in &site.urls {
        let host = host_of(&url_def.url)?;

        for test in &url_def.tests {
            if test.protocols.is_empty() {
                return Err(ConfigError::NoProtocols(url_def.url.clone()));
            }
            let action = resolve_action(site, test.action)?;

            for &protocol in &test.protocols {
                if protocol == Protocol::Tls && cert_expiry_weeks > 0 {
                    instructions.push(Instruction::Certificate {
                        host: host.clone(),
                        weeks: cert_expiry_weeks,
                    });
                }

                for &family in &families {
                    instructions.push(Instruction::Http {
                        url: url_def.url.clone(),
                        action: action.clone(),
                        protocol,
                        family,
                    });
                }
            }
        }
    }

    log::debug!(
        "Site {} expands to {} instruction(s)",
        site.name,
        instructions.len()
    );
    Ok(SitePlan {
        name: site.name.clone(),
        instructions,
    })
}

fn resolve_action(site: &SiteConfig, kind: ActionKind) -> Result<Action, ConfigError> {
    match kind {
        ActionKind::HttpSuccess => Ok(Action::HttpSuccess),
        ActionKind::ReturnString => required(&site.expected_string)
            .map(|expected| Action::ReturnString { expected })
            .ok_or_else(|| ConfigError::MissingExpectedString(site.name.clone())),
        ActionKind::Redirect => required(&site.canonical_address)
            .map(|canonical| Action::Redirect { canonical })
            .ok_or_else(|| ConfigError::MissingCanonicalAddress(site.name.clone())),
    }
}

fn required(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Host part of a scheme-less url, without any port.
fn host_of(url: &str) -> Result<String, ConfigError> {
    if has_scheme(url) {
        return Err(ConfigError::SchemeInUrl(url.to_string()));
    }

    Url::parse(&format!("https://{url}"))
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ConfigError::MissingHost(url.to_string()))
}

/// Whether `url` starts with `<scheme>://`. A `://` after the first `/`, `?`
/// or `#` belongs to the path or query.
fn has_scheme(url: &str) -> bool {
    url.split_once("://")
        .is_some_and(|(scheme, _)| !scheme.contains(['/', '?', '#']))
}
