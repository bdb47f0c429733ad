use std::path::PathBuf;
use std::process::ExitCode;

use anstream::eprint;
use anyhow::Result;
use clap::Parser;

use whl_metadata::RequestedExtra;
use whl_static::EnvVars;

use crate::commands::{ExitStatus, MarkerBinding};
use crate::printer::Printer;

mod commands;
mod logging;
mod printer;

/// Unpack a Python wheel and generate the `BUILD` file that exposes it as a `py_library`.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// The wheel to unpack.
    #[arg(long, value_name = "PATH")]
    whl: PathBuf,

    /// The label of the `.bzl` file defining the `requirement` macro, e.g.
    /// `@pip//:requirements.bzl`.
    ///
    /// Used verbatim in the `load` statement of the generated `BUILD` file.
    #[arg(long, value_name = "LABEL", env = EnvVars::WHL2BZL_REQUIREMENTS)]
    requirements: String,

    /// The directory to unpack the wheel into; the `BUILD` file is written there as well.
    #[arg(long, default_value = ".", env = EnvVars::WHL2BZL_DIRECTORY)]
    directory: PathBuf,

    /// An extra to generate a target for, named as given; may be provided more than once.
    #[arg(long = "extras", value_name = "EXTRA")]
    extras: Vec<RequestedExtra>,

    /// Fix the value of a marker variable (e.g., `sys_platform=linux`); may be provided more than
    /// once.
    ///
    /// Requirements whose markers don't hold for the given values are omitted. Variables without a
    /// value are assumed to match.
    #[arg(long, value_name = "KEY=VALUE")]
    marker_env: Vec<MarkerBinding>,

    /// Do not print any output.
    #[arg(long, short, conflicts_with = "verbose")]
    quiet: bool,

    /// Use verbose output.
    #[arg(long, short, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Control colors in output.
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum ColorChoice {
    /// Enables colored output only when the output is going to a terminal or TTY with support.
    Auto,

    /// Enables colored output regardless of the detected environment.
    Always,

    /// Disables colored output.
    Never,
}

impl From<ColorChoice> for anstream::ColorChoice {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => Self::Auto,
            ColorChoice::Always => Self::Always,
            ColorChoice::Never => Self::Never,
        }
    }
}

fn inner() -> Result<ExitStatus> {
    let cli = Cli::parse();

    anstream::ColorChoice::write_global(cli.color.into());

    // Configure the `tracing` crate, which controls internal logging.
    logging::setup_logging(logging::Level::from_verbosity(cli.verbose))?;

    // Configure the `Printer`, which controls user-facing output in the CLI.
    let printer = Printer::new(cli.quiet);

    // Configure the `warn_user!` macros, which control user-facing warnings in the CLI.
    if !cli.quiet {
        whl_warnings::enable();
    }

    commands::expand(
        &cli.whl,
        &cli.requirements,
        &cli.directory,
        &cli.extras,
        &cli.marker_env,
        printer,
    )
}

fn main() -> ExitCode {
    let status = inner().unwrap_or_else(|err| {
        #[allow(clippy::print_stderr)]
        {
            eprint!("{}", whl_warnings::Report::error(err.as_ref()));
        }
        ExitStatus::Error
    });
    status.into()
}
