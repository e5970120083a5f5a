use chrono::{DateTime, TimeDelta, Utc};

use super::outcome::Verdict;

/// Pass when the certificate stays valid for at least `weeks` weeks from `now`.
pub fn check_expiry(not_after: DateTime<Utc>, now: DateTime<Utc>, weeks: u32) -> Verdict {
    if not_after - now < TimeDelta::weeks(i64::from(weeks)) {
        return Verdict::fail(format!(
            "certificate expires in {}",
            not_after.date_naive()
        ));
    }
    Verdict::Pass
}
