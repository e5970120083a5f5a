pub mod app_config;
pub mod model;

pub use app_config::{load_config, parse_config, setup_resolver, setup_tls_connector};
pub use model::{ActionKind, MonitorConfig, Options, Protocol, SiteConfig, TestDef, UrlDef};
