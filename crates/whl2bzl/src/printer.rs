use std::fmt;

use anstream::eprint;

/// Where user-facing output goes: stderr, or nowhere under `--quiet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Printer {
    quiet: bool,
}

impl Printer {
    pub(crate) fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl fmt::Write for Printer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.quiet {
            #[allow(clippy::print_stderr)]
            {
                eprint!("{s}");
            }
        }
        Ok(())
    }
}
