pub mod mail;

pub use mail::Mailer;

use std::fmt::Write;

use crate::check::{RunSummary, TestOutcome};

/// Terminal report with colored outcomes.
pub fn render_console(summary: &RunSummary) -> String {
    render(summary, |outcome| &outcome.human_message)
}

/// Plain-text report used as the mail body.
pub fn render_mail(summary: &RunSummary) -> String {
    render(summary, |outcome| &outcome.machine_message)
}

fn render<F>(summary: &RunSummary, message: F) -> String
where
    F: Fn(&TestOutcome) -> &String,
{
    let mut out = String::new();
    for site in &summary.sites {
        let _ = write!(out, "_{}_\n\n", site.name);
        for outcome in &site.outcomes {
            let _ = write!(out, "{}\n\n", message(outcome));
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "\nSummary:\n{} tests passed\n{} tests failed\n{} sites re-tested\n",
        summary.success_count, summary.fail_count, summary.retried_site_count
    );
    out
}

/// Subject of the summary mail, or `None` when no mail should go out.
pub fn mail_subject(summary: &RunSummary, email_only_on_fail: bool) -> Option<String> {
    if summary.fail_count > 0 {
        return Some(format!("{} failing tests!", summary.fail_count));
    }
    if email_only_on_fail {
        return None;
    }
    Some(format!("all {} tests passed", summary.success_count))
}
