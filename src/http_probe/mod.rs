pub mod cert;
pub mod encoding;
pub mod header;
pub mod probe;
pub mod result;

pub use cert::{CertificateError, CertificateInspector};
pub use header::{HeaderParser, ResponseHead};
pub use probe::{IpFamily, Prober};
pub use result::{ProbeFailure, ProbeResponse};

use std::fmt::Write;

/// Render an error with its chain of causes on a single line.
fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}
