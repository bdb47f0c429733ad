/// Declares all environment variables read by `whl2bzl` and its crates.
pub struct EnvVars;

impl EnvVars {
    /// Equivalent to the `--directory` command-line argument. If set, the wheel is unpacked into
    /// this directory and the `BUILD` file is written there.
    pub const WHL2BZL_DIRECTORY: &'static str = "WHL2BZL_DIRECTORY";

    /// Equivalent to the `--requirements` command-line argument: the label of the `.bzl` file
    /// that defines the `requirement` macro.
    pub const WHL2BZL_REQUIREMENTS: &'static str = "WHL2BZL_REQUIREMENTS";

    /// If set, `whl2bzl` prefixes each log message with the spans it was emitted in.
    pub const WHL2BZL_LOG_CONTEXT: &'static str = "WHL2BZL_LOG_CONTEXT";

    /// Overrides the log filter, e.g. `RUST_LOG=whl_pep508=trace`.
    ///
    /// See the [tracing documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#example-syntax)
    /// for more.
    pub const RUST_LOG: &'static str = "RUST_LOG";
}
