use serde::Deserialize;

/// The sites file: global options plus the list of sites to monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub options: Options,
    pub sites: Vec<SiteConfig>,
}

/// Run-wide options from the `options` block of the sites file.
#[derive(Debug, Clone, Deserialize)]
pub struct Options {
    /// Minimum number of weeks a TLS certificate must remain valid.
    /// Zero disables certificate checks altogether.
    #[serde(rename = "cert expiry weeks", alias = "certExpiryWeeks")]
    pub cert_expiry_weeks: u32,

    /// Only send the summary mail when at least one test failed.
    #[serde(rename = "email only on fail", default)]
    pub email_only_on_fail: bool,

    /// Upper bound on concurrently running probes for a site, and on
    /// concurrently running sites.
    #[serde(rename = "max parallel probes", default = "default_max_parallel_probes")]
    pub max_parallel_probes: usize,

    /// Nameservers used for hostname resolution.
    /// Falls back to the system resolver configuration when empty.
    #[serde(rename = "dns hosts", default)]
    pub dns_hosts: Vec<String>,
}

/// A monitored site.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub urls: Vec<UrlDef>,

    #[serde(default = "default_true", alias = "testIPv4")]
    pub ipv4: bool,

    #[serde(default = "default_true", alias = "testIPv6")]
    pub ipv6: bool,

    /// Needed by `return string` tests.
    #[serde(rename = "expected string", alias = "expectedString", default)]
    pub expected_string: Option<String>,

    /// Needed by `redirect` tests.
    #[serde(rename = "canonical address", alias = "canonicalAddress", default)]
    pub canonical_address: Option<String>,
}

/// A scheme-less URL such as `example.com/status` and the tests run against it.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlDef {
    pub url: String,
    pub tests: Vec<TestDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestDef {
    pub action: ActionKind,
    pub protocols: Vec<Protocol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "http success", alias = "HttpSuccess")]
    HttpSuccess,
    #[serde(rename = "return string", alias = "ReturnString")]
    ReturnString,
    #[serde(rename = "redirect", alias = "Redirect")]
    Redirect,
}

impl ActionKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ActionKind::HttpSuccess => "http success",
            ActionKind::ReturnString => "return string",
            ActionKind::Redirect => "redirect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TLS")]
    Tls,
    #[serde(rename = "no-TLS", alias = "NoTLS")]
    NoTls,
}

impl Protocol {
    pub fn keyword(&self) -> &'static str {
        match self {
            Protocol::Tls => "TLS",
            Protocol::NoTls => "no-TLS",
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Tls => "https",
            Protocol::NoTls => "http",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_parallel_probes() -> usize {
    8
}
