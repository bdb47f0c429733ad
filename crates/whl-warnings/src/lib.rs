//! Warnings and error reports shown to the user on stderr.

use std::error::Error;
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

// Re-exported for `warn_user!`, so that callers don't need their own dependency.
#[doc(hidden)]
pub use anstream;
#[doc(hidden)]
pub use owo_colors;
use owo_colors::{AnsiColors, OwoColorize};

/// Set once `--quiet` has been ruled out; `warn_user!` is silent until then.
#[doc(hidden)]
pub static ENABLED: AtomicBool = AtomicBool::new(false);

/// Let `warn_user!` print from here on.
pub fn enable() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Print `warning: <message>` to stderr, unless warnings are disabled.
#[macro_export]
macro_rules! warn_user {
    ($($arg:tt)*) => {{
        use $crate::owo_colors::OwoColorize;

        if $crate::ENABLED.load(::std::sync::atomic::Ordering::Relaxed) {
            $crate::anstream::eprintln!(
                "{}{} {}",
                "warning".yellow().bold(),
                ":".bold(),
                format!($($arg)*).bold()
            );
        }
    }};
}

const CAUSE: &str = "Caused by";

/// Width of `  Caused by: `, the indent of every continuation line of a cause.
const HANGING_INDENT: usize = 2 + CAUSE.len() + 2;

/// An error followed by its chain of sources, one `Caused by:` line per source.
///
/// Sources that span several lines, such as parse errors with an underline, keep their
/// layout and are indented to start in the column of the first line:
///
/// ```text
/// error: Failed to parse `Requires-Dist` entry
///   Caused by: Missing closing `)` for the version specifiers
///              idna (<4,>=2.5
///                   ^
/// ```
pub struct Report<'a> {
    error: &'a dyn Error,
    label: &'a str,
    color: AnsiColors,
}

impl<'a> Report<'a> {
    /// An `error:` report, in red.
    pub fn error(error: &'a dyn Error) -> Self {
        Self::with_label(error, "error", AnsiColors::Red)
    }

    pub fn with_label(error: &'a dyn Error, label: &'a str, color: AnsiColors) -> Self {
        Self {
            error,
            label,
            color,
        }
    }

    fn write_cause(&self, f: &mut fmt::Formatter<'_>, cause: &dyn Error) -> fmt::Result {
        let message = cause.to_string();
        let mut lines = message.lines().map(str::trim_end);

        let first = lines.next().unwrap_or_default();
        writeln!(f, "  {}: {first}", CAUSE.color(self.color).bold())?;
        for line in lines {
            if line.is_empty() {
                f.write_char('\n')?;
            } else {
                writeln!(f, "{:HANGING_INDENT$}{line}", "")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}{} {}",
            self.label.color(self.color).bold(),
            ":".bold(),
            self.error.to_string().trim()
        )?;

        let mut source = self.error.source();
        while let Some(cause) = source {
            self.write_cause(f, cause)?;
            source = cause.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use indoc::indoc;
    use insta::assert_snapshot;

    use super::*;

    fn plain(report: Report) -> String {
        anstream::adapter::strip_str(&report.to_string()).to_string()
    }

    #[test]
    fn single_source() {
        #[derive(Debug, thiserror::Error)]
        #[error("Permission denied")]
        struct Inner;

        #[derive(Debug, thiserror::Error)]
        #[error("Failed to write `BUILD`")]
        struct Outer {
            #[source]
            source: Inner,
        }

        let error = Outer { source: Inner };
        assert_snapshot!(plain(Report::error(&error)), @r"
        error: Failed to write `BUILD`
          Caused by: Permission denied
        ");
    }

    #[test]
    fn context_layers() {
        let err = anyhow!("The archive doesn't contain `six-1.16.0.dist-info/METADATA`")
            .context("Failed to read metadata")
            .context("Failed to expand `six-1.16.0-py2.py3-none-any.whl`");

        assert_snapshot!(plain(Report::error(err.as_ref())), @r"
        error: Failed to expand `six-1.16.0-py2.py3-none-any.whl`
          Caused by: Failed to read metadata
          Caused by: The archive doesn't contain `six-1.16.0.dist-info/METADATA`
        ");
    }

    #[test]
    fn underlined_cause_keeps_its_columns() {
        let cause = indoc! {"
            Missing closing `)` for the version specifiers
            idna (<4,>=2.5
                 ^"};
        let err = anyhow!("{cause}").context("Failed to parse `Requires-Dist` entry");

        assert_snapshot!(plain(Report::error(err.as_ref())), @r"
        error: Failed to parse `Requires-Dist` entry
          Caused by: Missing closing `)` for the version specifiers
                     idna (<4,>=2.5
                          ^
        ");
    }

    #[test]
    fn custom_label() {
        let err = anyhow!("Unknown marker variable `os`");
        assert_snapshot!(plain(Report::with_label(err.as_ref(), "warning", AnsiColors::Yellow)), @"warning: Unknown marker variable `os`");
    }
}
