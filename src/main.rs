use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use trust_dns_resolver::TokioAsyncResolver;

pub mod check;
pub mod config;
pub mod error;
pub mod http_probe;
pub mod report;

use check::{Checker, Orchestrator, SitePlan, expand_all};
use config::{MonitorConfig, load_config, setup_resolver, setup_tls_connector};
use error::ConfigError;
use http_probe::{CertificateInspector, Prober};
use report::{Mailer, mail_subject, render_console, render_mail};

#[derive(Parser)]
#[command(name = "sitebox")]
#[command(about = "Tests websites over IPv4 and IPv6, with and without TLS")]
#[command(version)]
struct Cli {
    /// YAML file listing the sites to test
    #[arg(long, env = "SITES_FILE", default_value = "/etc/sitebox.yml")]
    sites_file: PathBuf,

    /// Mail the report to this address instead of printing it
    #[arg(long = "mailto", env = "MAILTO")]
    mail_address: Option<String>,

    /// Prefix for mail subjects
    #[arg(long, env = "ANNOTATION", default_value = "SiteBox")]
    annotation: String,

    /// Only send mail when at least one test failed
    #[arg(long = "email-only-on-fail")]
    email_only_on_fail: bool,

    /// SMTP relay used to deliver mail
    #[arg(long, env = "SMTP_RELAY", default_value = "localhost")]
    smtp_relay: String,

    /// Sender address of report mails
    #[arg(long, env = "MAIL_FROM", default_value = "sitebox@localhost")]
    mail_from: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red());
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if !cli.sites_file.is_file() {
        eprintln!(
            "Initialisation Error! Cannot find sitesfile at \"{}\"\nPlease place it here or specify location with --sites-file=",
            cli.sites_file.display()
        );
        return Ok(ExitCode::from(2));
    }

    let mailer = cli
        .mail_address
        .as_deref()
        .map(|to| Mailer::new(&cli.smtp_relay, &cli.mail_from, to, &cli.annotation))
        .transpose()?;

    let (config, plans, resolver) = match load_plans(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            config_fail(mailer.as_ref(), &e).await?;
            return Ok(ExitCode::from(2));
        }
    };

    let prober = Prober::new(resolver.clone())?;
    let inspector = CertificateInspector::new(setup_tls_connector()?, resolver);
    let checker = Checker::new(prober, inspector);

    let summary = Orchestrator::new(&checker, config.options.max_parallel_probes)
        .run(&plans)
        .await;

    match &mailer {
        None => print!("{}", render_console(&summary)),
        Some(mailer) => {
            let only_on_fail = cli.email_only_on_fail || config.options.email_only_on_fail;
            match mail_subject(&summary, only_on_fail) {
                Some(subject) => mailer.send(&subject, &render_mail(&summary)).await?,
                None => log::info!("All tests passed, not sending mail"),
            }
        }
    }

    if summary.fail_count > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Load and validate the sites file before the first probe goes out.
fn load_plans(cli: &Cli) -> Result<(MonitorConfig, Vec<SitePlan>, TokioAsyncResolver), ConfigError> {
    let config = load_config(&cli.sites_file)?;
    let plans = expand_all(&config)?;
    let resolver = setup_resolver(&config.options.dns_hosts)?;
    Ok((config, plans, resolver))
}

/// Report a configuration problem, by mail when a recipient is configured.
async fn config_fail(mailer: Option<&Mailer>, error: &ConfigError) -> anyhow::Result<()> {
    let message = error.to_string();
    log::error!("Configuration error: {message}");

    match mailer {
        None => println!("{}", format!("  Config Error! {message}").yellow()),
        Some(mailer) => {
            mailer
                .send("config error!", &format!("  Config Error! {message}\n"))
                .await?
        }
    }
    Ok(())
}
