use std::process::ExitCode;
use std::time::Duration;

pub(crate) use expand::{MarkerBinding, expand};

mod expand;

/// The process exit status of a command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum ExitStatus {
    Success = 0,
    /// Any failure; `clap` uses the same code for invalid arguments.
    Error = 2,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status as u8)
    }
}

/// `2m 05s`, `1.25s`, `42ms` or `0.15ms`, depending on the magnitude of `duration`.
pub(super) fn elapsed(duration: Duration) -> String {
    let micros = duration.as_micros();
    match micros {
        60_000_000.. => {
            let secs = duration.as_secs();
            format!("{}m {:02}s", secs / 60, secs % 60)
        }
        1_000_000.. => format!("{:.2}s", duration.as_secs_f64()),
        1_000.. => format!("{}ms", micros / 1_000),
        _ => format!("0.{:02}ms", micros / 10),
    }
}
