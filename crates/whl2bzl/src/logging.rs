use std::fmt;
use std::str::FromStr;

use anstream::ColorChoice;
use anyhow::Context;
use owo_colors::{AnsiColors, OwoColorize};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use tracing_tree::HierarchicalLayer;
use tracing_tree::time::Uptime;

use whl_static::EnvVars;

/// How much of the internal logging reaches stderr, as selected with `-v`.
///
/// `RUST_LOG` takes precedence over the default of every level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    /// Nothing.
    #[default]
    Default,
    /// One line per debug message.
    Verbose,
    /// Debug messages in a tree of the spans they were emitted in, with timings.
    ExtraVerbose,
}

impl Level {
    pub(crate) fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => Self::Default,
            1 => Self::Verbose,
            _ => Self::ExtraVerbose,
        }
    }

    /// The filter applied when `RUST_LOG` is unset.
    fn default_directive(self) -> anyhow::Result<Directive> {
        match self {
            Self::Default => Ok(LevelFilter::OFF.into()),
            // A target prefix: the binary and all `whl_*` crates.
            Self::Verbose | Self::ExtraVerbose => Ok(Directive::from_str("whl=debug")?),
        }
    }
}

/// `LEVEL [span:span:] message`, one line per event.
struct LineFormat {
    /// Prefix each message with the spans it was emitted in.
    spans: bool,
}

fn level_color(level: tracing::Level) -> AnsiColors {
    match level {
        tracing::Level::ERROR => AnsiColors::Red,
        tracing::Level::WARN => AnsiColors::Yellow,
        tracing::Level::INFO => AnsiColors::Green,
        tracing::Level::DEBUG => AnsiColors::Blue,
        tracing::Level::TRACE => AnsiColors::Magenta,
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let ansi = writer.has_ansi_escapes();

        let level = *event.metadata().level();
        if ansi {
            write!(writer, "{} ", level.color(level_color(level)))?;
        } else {
            write!(writer, "{level} ")?;
        }

        if self.spans {
            if let Some(scope) = ctx.event_scope() {
                let mut any = false;
                for span in scope.from_root() {
                    let name = span.metadata().name();
                    if ansi {
                        write!(writer, "{}:", name.bold())?;
                    } else {
                        write!(writer, "{name}:")?;
                    }
                    any = true;
                }
                if any {
                    writer.write_char(' ')?;
                }
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global `tracing` subscriber for the given [`Level`], writing to stderr.
pub(crate) fn setup_logging(level: Level) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.default_directive()?)
        .with_env_var(EnvVars::RUST_LOG)
        .from_env()
        .context("Invalid RUST_LOG directives")?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match level {
        Level::Default | Level::Verbose => {
            let ansi = matches!(
                anstream::Stderr::choice(&std::io::stderr()),
                ColorChoice::Always | ColorChoice::AlwaysAnsi
            );
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat {
                    spans: std::env::var_os(EnvVars::WHL2BZL_LOG_CONTEXT).is_some(),
                })
                .with_writer(std::io::stderr)
                .with_ansi(ansi)
                .with_filter(filter)
                .boxed()
        }
        Level::ExtraVerbose => HierarchicalLayer::default()
            .with_targets(true)
            .with_timer(Uptime::default())
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .context("Failed to install the log subscriber")
}
