use crate::config::ActionKind;
use crate::http_probe::ResponseHead;

use super::outcome::Verdict;

/// An assertion on a probe response, carrying the configuration it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Status must be 200.
    HttpSuccess,
    /// Status must be 200 and the body must contain `expected` literally.
    ReturnString { expected: String },
    /// Status must be 3xx with a `Location` equal to `canonical`, byte for byte.
    Redirect { canonical: String },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::HttpSuccess => ActionKind::HttpSuccess,
            Action::ReturnString { .. } => ActionKind::ReturnString,
            Action::Redirect { .. } => ActionKind::Redirect,
        }
    }

    pub fn evaluate(&self, head: &ResponseHead, body: &str) -> Verdict {
        let status = head.status();
        match self {
            Action::HttpSuccess => {
                if status != 200 {
                    return Verdict::fail(format!("HTTP status is: {status}"));
                }
                Verdict::Pass
            }
            Action::ReturnString { expected } => {
                if status != 200 {
                    return Verdict::fail(format!("HTTP status is: {status}"));
                }
                if !body.contains(expected.as_str()) {
                    return Verdict::fail("Don't find expected string!");
                }
                Verdict::Pass
            }
            Action::Redirect { canonical } => {
                if status / 100 != 3 {
                    return Verdict::fail(format!("Response code is not a redirect: {status}"));
                }
                let Some(location) = head.header("location") else {
                    return Verdict::fail("Response code is a redirect but no Location header!");
                };
                if location != canonical.as_str() {
                    return Verdict::fail(format!("Redirect location is wrong: {location}"));
                }
                Verdict::Pass
            }
        }
    }
}
