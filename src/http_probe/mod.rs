pub mod probe;
pub mod result;
pub mod target;

pub mod prelude {
    pub use super::probe::Prober;
    pub use super::result::{ProbeFailure, ProbeResult};
    pub use super::target::Target;
}

use std::fmt::Write;

/// Flattens an error and its sources into one line for logging.
fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": caused by: {}", src);
        err = src;
    }
    s
}
