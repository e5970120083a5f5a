use anyhow::Context;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Sends reports through an unauthenticated SMTP relay.
pub struct Mailer {
    relay: String,
    from: Mailbox,
    to: Mailbox,
    annotation: String,
}

impl Mailer {
    pub fn new(relay: &str, from: &str, to: &str, annotation: &str) -> anyhow::Result<Self> {
        Ok(Self {
            relay: relay.to_string(),
            from: from
                .parse()
                .with_context(|| format!("invalid sender address \"{from}\""))?,
            to: to
                .parse()
                .with_context(|| format!("invalid recipient address \"{to}\""))?,
            annotation: annotation.to_string(),
        })
    }

    /// The full subject line: `<annotation>: <subject>`.
    pub fn subject(&self, subject: &str) -> String {
        format!("{}: {}", self.annotation, subject)
    }

    pub fn build(&self, subject: &str, body: &str) -> anyhow::Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject(subject))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("cannot build mail")
    }

    pub async fn send(&self, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = self.build(subject, body)?;
        let transport =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.relay.as_str()).build();

        transport
            .send(message)
            .await
            .with_context(|| format!("cannot send mail through {}", self.relay))?;
        log::info!("Sent \"{}\" to {}", self.subject(subject), self.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_is_annotated() {
        let mailer = Mailer::new("localhost", "sitebox@localhost", "ops@example.com", "SiteBox").unwrap();
        assert_eq!(mailer.subject("3 failing tests!"), "SiteBox: 3 failing tests!");
    }

    #[test]
    fn test_build_message() {
        let mailer = Mailer::new("localhost", "sitebox@localhost", "ops@example.com", "Prod").unwrap();
        let message = mailer.build("config error!", "  Config Error! bad\n").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Prod: config error!"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Config Error! bad"));
    }

    #[test]
    fn test_invalid_recipient() {
        assert!(Mailer::new("localhost", "sitebox@localhost", "not an address", "SiteBox").is_err());
    }
}
