use std::fmt;

use colored::Colorize;

/// Pass/fail decision of a single check, before it is described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

impl Verdict {
    pub fn fail(reason: impl fmt::Display) -> Self {
        Verdict::Fail(reason.to_string())
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// The reportable result of one check: a colored message for terminals and
/// a plain one for mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub success: bool,
    pub human_message: String,
    pub machine_message: String,
}

impl TestOutcome {
    /// Prefix both messages with a line describing what was checked.
    pub fn described(self, description: &str) -> Self {
        Self {
            success: self.success,
            human_message: format!("{description}\n{}", self.human_message),
            machine_message: format!("{description}\n{}", self.machine_message),
        }
    }
}

impl From<Verdict> for TestOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => {
                let message = " Test Success!";
                TestOutcome {
                    success: true,
                    human_message: message.green().to_string(),
                    machine_message: message.to_string(),
                }
            }
            Verdict::Fail(reason) => {
                let message = format!("  Test Fail! {reason}");
                TestOutcome {
                    success: false,
                    human_message: message.as_str().red().to_string(),
                    machine_message: message,
                }
            }
        }
    }
}
